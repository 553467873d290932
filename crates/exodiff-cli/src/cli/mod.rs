mod commands;

use clap::{ArgAction, Parser};
use exodiff_core::compare::CompareError;
use exodiff_core::dataset::DatasetError;
use exodiff_core::domain::ExodiffError;
use exodiff_core::policy::PolicyError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let exodiff_error = error.as_exodiff_error();
            eprintln!("{}", exodiff_error.diagnostic_line());
            if let Some(summary_line) = exodiff_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            exodiff_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("exodiff-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // a second init in the same process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "exodiff-rs",
    version,
    about = "Compare two Exodus II files within numerical tolerances"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compare two Exodus II files
    Compare(commands::CompareArgs),
    /// Print the dimensions, variables and attributes of a file
    Inspect(commands::InspectArgs),
    /// Run the comparison cases listed in a manifest
    Regression(commands::RegressionArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Compare(args) => commands::run_compare_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
        CliCommand::Regression(args) => commands::run_regression_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(ExodiffError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_exodiff_error(&self) -> ExodiffError {
        match self {
            Self::Usage(message) => {
                ExodiffError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => ExodiffError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<CompareError> for CliError {
    fn from(error: CompareError) -> Self {
        Self::Compute(error.into())
    }
}

impl From<DatasetError> for CliError {
    fn from(error: DatasetError) -> Self {
        Self::Compute(error.into())
    }
}

impl From<PolicyError> for CliError {
    fn from(error: PolicyError) -> Self {
        Self::Compute(error.into())
    }
}
