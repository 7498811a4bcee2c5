use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "navdb",
    version,
    about = "Load daily mutual fund NAV disclosures into SQLite"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value = "funds.db")]
    pub db_path: PathBuf,

    #[arg(long, value_enum, default_value_t = DateMode::Calendar)]
    pub date_mode: DateMode,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

/// How observation dates are stored.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DateMode {
    /// ISO `YYYY-MM-DD` text in the `nav` table.
    Calendar,
    /// Signed day count since 2006-01-01 in the `funds` table.
    EpochOffset,
}

impl DateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::EpochOffset => "epoch-offset",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "calendar" => Some(Self::Calendar),
            "epoch-offset" => Some(Self::EpochOffset),
            _ => None,
        }
    }

    pub fn observation_table(self) -> &'static str {
        match self {
            Self::Calendar => "nav",
            Self::EpochOffset => "funds",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "funds.db")]
    pub db_path: PathBuf,
}
