//! Command-line client for omnichain smart accounts.
//!
//! Loads an account configuration, then prepares, signs and submits
//! transactions, waits for their outcome, or inspects session state.

mod factory;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use omni_config::Config;
use omni_core::{ExecutionOutcome, PipelineArtifact, PreparedTransaction, TransactionResult};
use omni_types::{Session, Transaction};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to the account configuration file
	#[arg(short, long, default_value = "config/account.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the account address
	Address,
	/// Prepare a transaction; prints the prepared artifact JSON
	Prepare {
		/// JSON file with the transaction
		#[arg(long)]
		transaction: PathBuf,
	},
	/// Sign a prepared artifact; prints the signed artifact JSON
	Sign {
		/// JSON file with a prepared artifact
		#[arg(long)]
		artifact: PathBuf,
	},
	/// Prepare, sign and submit a transaction; prints the result JSON
	Send {
		/// JSON file with the transaction
		#[arg(long)]
		transaction: PathBuf,
	},
	/// Continue a persisted pipeline artifact up to submission
	Resume {
		/// JSON file with a prepared, signed or submitted artifact
		#[arg(long)]
		artifact: PathBuf,
	},
	/// Wait for a submitted transaction to finish
	Wait {
		/// JSON file with the result printed by `send`
		#[arg(long)]
		result: PathBuf,
		/// Only return once a bundle is filled
		#[arg(long)]
		no_preconfirmations: bool,
	},
	/// Show whether a session is installed on a chain
	SessionStatus {
		#[arg(long)]
		chain: u64,
		/// JSON file with the session
		#[arg(long)]
		session: PathBuf,
		/// Install the session when it is missing
		#[arg(long)]
		install: bool,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	// Load environment variables from .env file if it exists
	let _ = dotenvy::dotenv();

	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config)
		.await
		.with_context(|| format!("Failed to load {}", args.config.display()))?;
	let account = factory::build_account(&config)?;

	match args.command {
		Command::Address => println!("{}", account.address()),
		Command::Prepare { transaction } => {
			let transaction: Transaction = read_json(&transaction).await?;
			let prepared = account.prepare_transaction(transaction).await?;
			println!("{}", serde_json::to_string_pretty(&PipelineArtifact::from(prepared))?);
		},
		Command::Sign { artifact } => {
			let prepared = prepared_stage(read_json(&artifact).await?)?;
			let signed = account.sign_transaction(prepared).await?;
			if !signed.is_complete() {
				tracing::warn!("Signatures are below the owner threshold; co-signers must add theirs");
			}
			println!("{}", serde_json::to_string_pretty(&PipelineArtifact::from(signed))?);
		},
		Command::Send { transaction } => {
			let transaction: Transaction = read_json(&transaction).await?;
			let result = account.send_transaction(transaction).await?;
			println!("{}", serde_json::to_string_pretty(&result)?);
		},
		Command::Resume { artifact } => {
			let artifact: PipelineArtifact = read_json(&artifact).await?;
			let result = account.resume(artifact).await?;
			println!("{}", serde_json::to_string_pretty(&result)?);
		},
		Command::Wait { result, no_preconfirmations } => {
			let result: TransactionResult = read_json(&result).await?;
			let outcome = account
				.wait_for_execution_with(&result, !no_preconfirmations)
				.await?;
			let json = match outcome {
				ExecutionOutcome::UserOperation(receipt) => serde_json::to_string_pretty(&receipt)?,
				ExecutionOutcome::Bundle(bundle) => serde_json::to_string_pretty(&bundle)?,
			};
			println!("{}", json);
		},
		Command::SessionStatus { chain, session, install } => {
			let session: Session = read_json(&session).await?;
			let permission_id = account.permission_id(&session);
			let installed = if install {
				account.ensure_session_installed(chain, &session).await?;
				true
			} else {
				account.is_session_installed(chain, &session).await?
			};
			println!(
				"{}",
				serde_json::json!({
					"chainId": chain,
					"permissionId": permission_id,
					"installed": installed,
				})
			);
		},
	}

	Ok(())
}

/// Only prepared artifacts can be signed.
fn prepared_stage(artifact: PipelineArtifact) -> Result<PreparedTransaction> {
	match artifact {
		PipelineArtifact::Prepared(prepared) => Ok(prepared),
		PipelineArtifact::Signed(_) => bail!("Artifact is already signed; use `resume` to submit it"),
		PipelineArtifact::Submitted(_) => bail!("Artifact was already submitted; use `wait`"),
	}
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
	let content = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read {}", path.display()))?;
	serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
