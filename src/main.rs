use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pulse::cli::ui::OutputFormat;
use pulse::core::log::init_logging;
use pulse::core::metric::MetricStream;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Output format for results
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for pulse::AppCommand {
    fn from(cmd: Commands) -> pulse::AppCommand {
        match cmd {
            Commands::Pricing { products, refresh } => {
                pulse::AppCommand::Pricing { products, refresh }
            }
            Commands::Forecast { product, periods } => {
                pulse::AppCommand::Forecast { product, periods }
            }
            Commands::Churn { customers } => pulse::AppCommand::Churn { customers },
            Commands::Watch { streams, ticks } => pulse::AppCommand::Watch { streams, ticks },
            Commands::History { periods, horizon } => {
                pulse::AppCommand::History { periods, horizon }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show price recommendations (all products when none are given)
    Pricing {
        products: Vec<String>,
        /// Simulate a market refresh before recommending
        #[arg(short, long)]
        refresh: bool,
    },
    /// Forecast demand for one product, or for all of them
    Forecast {
        product: Option<String>,
        /// Number of periods to project
        #[arg(short, long)]
        periods: Option<usize>,
    },
    /// Score churn risk (all customers when none are given)
    Churn { customers: Vec<String> },
    /// Print live metric samples
    Watch {
        /// Streams to watch, e.g. revenue or churnRate (all when omitted)
        #[arg(short, long = "stream")]
        streams: Vec<MetricStream>,
        /// Stop after this many samples per stream (at least 1)
        #[arg(short, long)]
        ticks: Option<usize>,
    },
    /// Display a revenue history with a trend forecast
    History {
        /// Months of history to generate
        #[arg(short, long, default_value_t = 12)]
        periods: usize,
        /// Months to forecast past the history
        #[arg(long, default_value_t = 6)]
        horizon: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => pulse::cli::setup::setup(),
        Some(cmd) => pulse::run_command(cmd.into(), cli.config_path.as_deref(), cli.format).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
