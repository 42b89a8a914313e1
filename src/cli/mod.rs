use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "aegis-aggregator")]
#[command(about = "Flight/weather data aggregation and policy-trigger payout pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and run migrations
    Init {
        /// Database URL (e.g. sqlite://aegis.db)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Run the internal HTTP server and the Policy Monitor background loop
    Serve {
        /// Address to bind the internal API server to
        #[arg(long, default_value = "127.0.0.1:8088")]
        bind: String,
    },

    /// Run a single on-demand Policy Monitor scan cycle, then exit
    Check,

    /// Manually process a triggered-payout batch for the given policy IDs
    Trigger {
        /// Policy IDs to process
        #[arg(long, required = true, value_delimiter = ',')]
        policy_ids: Vec<Uuid>,

        /// Human-readable trigger reason
        #[arg(long)]
        reason: String,

        /// Identity of the caller requesting the trigger
        #[arg(long, default_value = "cli")]
        requested_by: String,
    },

    /// Fetch aggregated flight/weather data for a quote, without creating a policy
    Quote {
        /// Flight number, e.g. UA456
        #[arg(long)]
        flight_number: String,

        /// Flight date (YYYY-MM-DD)
        #[arg(long)]
        date: chrono::NaiveDate,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
