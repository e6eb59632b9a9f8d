use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Args, Parser, Subcommand};
use decommission_aws::{AwsProvider, AwsProviderConfig};
use decommission_core::{
    config::Settings,
    error::{ConfigurationError, Error, Result},
};
use tokio::sync::watch;
use tracing::{error, warn};

mod commands {
    pub mod node;
    pub mod resolve;
    pub mod terminate;
}

#[derive(Parser)]
#[command(name = "decommission")]
#[command(about = "Resolve and terminate cluster nodes", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOptions {
    #[arg(long, global = true, help = "Configuration file (default: ~/.decommission/config)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Seconds between status checks")]
    poll_interval: Option<u64>,

    #[arg(long, global = true, help = "Seconds to wait for a confirmed termination")]
    deadline: Option<u64>,

    #[arg(long, global = true, help = "Attempts per provider call, first try included")]
    max_attempts: Option<u32>,

    #[arg(long, global = true, help = "Print results as JSON")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the instance ID behind a node's private IP
    Resolve {
        #[arg(long, help = "Private IP address of the node")]
        ip: String,
        #[arg(long)]
        region: Option<String>,
    },
    /// Terminate an instance and wait for the provider to confirm it
    Terminate {
        #[arg(help = "The EC2 instance ID to terminate")]
        instance_id: String,
        #[arg(long)]
        region: Option<String>,
    },
    /// Resolve a node's private IP and terminate its instance
    Node {
        #[arg(long, help = "Private IP address of the node")]
        ip: String,
        #[arg(long)]
        region: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aws_smithy_runtime=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_outcome_unknown() => {
            warn!(%error, "termination outcome unknown; check the instance before retrying");
            ExitCode::from(2)
        }
        Err(error) => {
            error!(%error, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli.options).await?;
    let provider = AwsProvider::new(&AwsProviderConfig::from(&settings)).await;
    let json = cli.options.json;

    match cli.command {
        Commands::Resolve { ip, region } => {
            let region = pick_region(region, &settings, &provider)?;
            commands::resolve::resolve(&provider, &ip, &region, json).await
        }
        Commands::Terminate {
            instance_id,
            region,
        } => {
            let region = pick_region(region, &settings, &provider)?;
            commands::terminate::terminate(
                &provider,
                &settings,
                &instance_id,
                &region,
                shutdown_signal(),
                json,
            )
            .await
        }
        Commands::Node { ip, region } => {
            let region = pick_region(region, &settings, &provider)?;
            commands::node::decommission(&provider, &settings, &ip, &region, shutdown_signal(), json)
                .await
        }
    }
}

async fn load_settings(options: &GlobalOptions) -> Result<Settings> {
    let mut settings = match &options.config {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load_default().await?,
    };
    if let Some(secs) = options.poll_interval {
        settings.termination.poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = options.deadline {
        settings.termination.deadline = Duration::from_secs(secs);
    }
    if let Some(max_attempts) = options.max_attempts {
        settings.max_attempts = max_attempts;
    }
    settings.validate()?;
    Ok(settings)
}

fn pick_region(flag: Option<String>, settings: &Settings, provider: &AwsProvider) -> Result<String> {
    flag.or_else(|| settings.region.clone())
        .or_else(|| provider.default_region())
        .ok_or_else(|| {
            Error::from(ConfigurationError::InvalidValue {
                field: "region".to_string(),
                reason: "no region given and none configured".to_string(),
            })
        })
}

/// Flips to `true` on Ctrl-C.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (sender, receiver) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = sender.send(true);
        }
    });
    receiver
}
