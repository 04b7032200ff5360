//! gfe CLI - Main entry point

mod cli;
mod generate;

use clap::{Parser, Subcommand, ValueEnum};
use gfe_foundation::{load_config_from_file, ConfigLoader, FailurePolicy, GfeConfig, Placement};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// gfe - generate data specifications for placed vertices
#[derive(Parser, Debug)]
#[command(name = "gfe")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (skips the default search paths)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one data specification per placement of a chip grid
    Generate {
        /// Chips along x
        #[arg(long, default_value = "1")]
        width: u32,

        /// Chips along y
        #[arg(long, default_value = "1")]
        height: u32,

        /// Application cores per chip (processors 1..=cores)
        #[arg(long, default_value = "4")]
        cores: u32,

        /// Output directory for the generated files
        #[arg(short, long, default_value = "dsg_output")]
        output: PathBuf,

        /// Placement (x.y.p) whose generation should fail; repeatable
        #[arg(long = "fail")]
        fail: Vec<Placement>,

        /// Failure policy (overrides the configuration)
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Write a JSON report of all outcomes
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Wait for every placement and report all failures
    Collect,
    /// Stop at the first failure
    Abort,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Collect => FailurePolicy::CollectAll,
            PolicyArg::Abort => FailurePolicy::AbortOnFirstFailure,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    gfe_task::install_origin_hook();

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Generate {
            width,
            height,
            cores,
            output,
            fail,
            policy,
            report,
        } => {
            if let Some(policy) = policy {
                config.batch.failure_policy = policy.into();
            }
            let request = cli::GenerateRequest {
                width,
                height,
                cores,
                output,
                failing: fail,
                report,
            };
            cli::run_generate(&config, &request)
        }
        Command::Config => {
            print!("{}", cli::render_config(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<GfeConfig> {
    match path {
        Some(path) => Ok(load_config_from_file(path)?),
        None => {
            let working_dir = std::env::current_dir()?;
            Ok(ConfigLoader::new(&working_dir).load_all()?)
        }
    }
}
