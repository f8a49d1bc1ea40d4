use crate::pipeline::PipelineOptions;
use clap::Parser;
use nhl_api::DateRange;
use nhl_api::client::NHLE_WEB_V1;
use std::fmt;
use std::time::Duration;

/// Load NHL play-by-play for a season into an Elasticsearch index.
///
/// Index credentials come from the environment (a `.env` file is honored):
/// ELASTIC_CLOUD_ID + ELASTIC_API_KEY, or ELASTIC_HOST / ELASTIC_PORT /
/// HTTP_SCHEME with ELASTIC_API_KEY or ELASTIC_USERNAME + ELASTIC_PASSWORD.
#[derive(Debug, Clone, Parser)]
#[command(name = "nhl-ingest", version, about)]
pub struct Settings {
    /// Season year; the scan starts on January 1 of this year
    #[arg(long, env = "NHL_SEASON", value_parser = clap::value_parser!(i32).range(1900..=2100))]
    pub season: i32,

    /// Only ingest this game id
    #[arg(long, env = "NHL_GAME_ID")]
    pub game: Option<u64>,

    /// Number of days to scan from the season start
    #[arg(long, env = "NHL_END_DAYS", default_value_t = 365)]
    pub days: u32,

    /// Play-by-play requests in flight at once within a day
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Timeout for each NHL API request, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Timeout for each index request, in seconds
    #[arg(long, default_value_t = 60)]
    pub index_timeout_secs: u64,

    /// Base URL of the NHL web API
    #[arg(long, env = "NHL_API_BASE", default_value = NHLE_WEB_V1)]
    pub api_base: String,

    /// Target index name
    #[arg(long, env = "NHL_INDEX", default_value = "nhl")]
    pub index: String,

    /// Documents per bulk request
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u32).range(1..))]
    pub bulk_chunk_size: u32,

    /// Create the index with the play mapping if it does not exist yet
    #[arg(long)]
    pub create_index: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Settings {
    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        DateRange::for_season(self.season, self.days).ok_or(ConfigError::InvalidRange {
            season: self.season,
            days: self.days,
        })
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions, ConfigError> {
        Ok(PipelineOptions {
            range: self.date_range()?,
            game_filter: self.game,
            concurrency: usize::from(self.concurrency),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar { name: &'static str, value: String, reason: String },
    InvalidRange { season: i32, days: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => write!(f, "{name} must be set"),
            ConfigError::InvalidVar { name, value, reason } => {
                write!(f, "invalid {name}={value:?}: {reason}")
            }
            ConfigError::InvalidRange { season, days } => {
                write!(f, "{days} days from {season}-01-01 is not a valid date range")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
