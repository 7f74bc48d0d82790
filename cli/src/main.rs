//! keylink: verify a linked resource and attach it to a key.

mod console;
mod keyring;
mod provider;

use anyhow::{bail, Context};
use clap::Parser;
use keylink_submission::{CryptoInput, RequiredInput, SubmissionTarget};
use keylink_types::{Fingerprint, KeyId};
use keylink_verification::{ResourceSpec, VerificationRunner};
use keylink_workflow::{
    init_logging, HostContext, WorkflowConfig, WorkflowController, WorkflowDriver, WorkflowPhase,
    WorkflowSetup,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::console::ConsoleHost;
use crate::keyring::FileKeyringBackend;
use crate::provider::LocalFileProvider;

#[derive(Parser)]
#[command(name = "keylink", about = "Link external resources to OpenPGP keys")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, global = true, env = "KEYLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, global = true, env = "KEYLINK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, global = true, env = "KEYLINK_LOG_FORMAT")]
    log_format: Option<String>,

    /// Minimum duration of a verification attempt, in milliseconds.
    #[arg(long, global = true, env = "KEYLINK_MIN_VERIFY_MS")]
    min_verify_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Check that a file contains the proof token for a fingerprint.
    Verify {
        #[arg(long)]
        fingerprint: Fingerprint,
        #[arg(long)]
        file: PathBuf,
    },
    /// Verify a file, then record it as a linked attribute in a keyring.
    Link {
        #[arg(long)]
        fingerprint: Fingerprint,
        /// Key to attach to (defaults to the fingerprint's key id).
        #[arg(long)]
        key_id: Option<KeyId>,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, env = "KEYLINK_KEYRING")]
        keyring: PathBuf,
        /// Passphrase for a locked key.
        #[arg(long, env = "KEYLINK_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
        /// Fixed signature time, seconds since the Unix epoch.
        #[arg(long)]
        signature_time: Option<u64>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// File config (or defaults) with flag and env overrides applied.
fn effective_config(cli: &Cli) -> anyhow::Result<WorkflowConfig> {
    let mut config = match &cli.config {
        Some(path) => WorkflowConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WorkflowConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(ms) = cli.min_verify_ms {
        config.min_verify_duration_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Verify { fingerprint, file } => verify(&config, fingerprint, file).await,
        Command::Link {
            fingerprint,
            key_id,
            file,
            keyring,
            passphrase,
            signature_time,
        } => {
            let target = match key_id {
                Some(key_id) => SubmissionTarget::new(key_id, fingerprint),
                None => SubmissionTarget::from_fingerprint(fingerprint),
            };
            let input = CryptoInput {
                passphrase,
                signature_time,
            };
            link(&config, target, file, keyring, input).await
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn verify(
    config: &WorkflowConfig,
    fingerprint: Fingerprint,
    file: PathBuf,
) -> anyhow::Result<()> {
    let runner = VerificationRunner::new(config.min_verify_duration());
    let spec = ResourceSpec::Local { path: file };
    let outcome = runner
        .run(Arc::new(LocalFileProvider), spec, fingerprint, 1)
        .await;

    print!("{}", outcome.log());
    if let Some(appendix) = outcome.appendix() {
        println!("{appendix}");
    }
    match outcome.resource() {
        Some(resource) => {
            println!("verified {}", resource.resource().uri());
            Ok(())
        }
        None => match outcome.error() {
            Some(e) => bail!("verification failed: {e}"),
            None => bail!("verification failed"),
        },
    }
}

async fn link(
    config: &WorkflowConfig,
    target: SubmissionTarget,
    file: PathBuf,
    keyring: PathBuf,
    input: CryptoInput,
) -> anyhow::Result<()> {
    let host = Arc::new(ConsoleHost::default());
    let setup = WorkflowSetup {
        target,
        spec: ResourceSpec::Local { path: file },
        provider: Arc::new(LocalFileProvider),
        backend: Arc::new(FileKeyringBackend::new(&keyring)),
    };
    let context = HostContext::new(host.clone(), host.clone(), host);
    let (controller, events) = WorkflowController::new(setup, context, config);

    let lifecycle = controller.lifecycle().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, abandoning workflow");
            lifecycle.tear_down();
        }
    });

    let mut driver = WorkflowDriver::new(controller, events);

    driver.controller_mut().request_verify()?;
    match driver.settle().await {
        WorkflowPhase::Verified => {}
        WorkflowPhase::VerifyFailed => bail!("verification failed"),
        phase => bail!("interrupted while {phase}"),
    }

    driver.controller_mut().request_submit_with(input)?;
    match driver.settle().await {
        WorkflowPhase::Done => {
            let uri = driver
                .controller()
                .verified_resource()
                .map(|r| r.resource().uri().to_string())
                .unwrap_or_default();
            println!("linked {uri} to key {} in {}", target.key_id, keyring.display());
            Ok(())
        }
        WorkflowPhase::SubmitFailed => match driver.controller().pending_input() {
            Some(RequiredInput::Passphrase(key_id)) => {
                bail!("key {key_id} is locked; pass --passphrase")
            }
            Some(RequiredInput::SignatureTime) => bail!("pass --signature-time to continue"),
            None => bail!("could not save the attestation"),
        },
        phase => bail!("interrupted while {phase}"),
    }
}
