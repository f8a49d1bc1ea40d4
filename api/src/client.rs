use crate::nhle::{LocalizedName, NhlePlay, NhleTeam, PlayByPlayResponse, ScheduleResponse};
use crate::{GameFeed, GameRef, PlayEvent, Team};
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const NHLE_WEB_V1: &str = "https://api-web.nhle.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const BODY_SNIPPET_CHARS: usize = 200;

const HOME_TEAM_FALLBACK: &str = "Home Team";
const AWAY_TEAM_FALLBACK: &str = "Away Team";
const VENUE_FALLBACK: &str = "Venue";

/// NHL API client backed by the public api-web.nhle.com endpoints.
#[derive(Debug, Clone)]
pub struct NhlApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for NhlApi {
    fn default() -> Self {
        Self::with_base_url(NHLE_WEB_V1)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    /// Non-success HTTP status, with the start of the response body.
    Status { url: String, status: StatusCode, body: String },
    Parsing(reqwest::Error, String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Status { url, status, body } if body.is_empty() => {
                write!(f, "HTTP {status} for {url}")
            }
            ApiError::Status { url, status, body } => write!(f, "HTTP {status} for {url}: {body}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e, _) | ApiError::Parsing(e, _) => Some(e),
            ApiError::Status { .. } => None,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl NhlApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another deployment of the API (or a test server).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("nhl-ingest/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Per-request timeout applied to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the games listed by the schedule endpoint for `date`.
    ///
    /// The endpoint answers with the week starting at `date`, so games on the
    /// following days are returned too, each paired with its own listed date.
    pub async fn fetch_schedule(&self, date: NaiveDate) -> ApiResult<Vec<GameRef>> {
        let url = format!("{}/schedule/{}", self.base_url, date.format("%Y-%m-%d"));
        let raw: ScheduleResponse = self.get(&url).await?;
        Ok(map_schedule(raw))
    }

    /// Fetch play-by-play for one game.
    pub async fn fetch_play_by_play(&self, game_id: u64) -> ApiResult<GameFeed> {
        let url = format!("{}/gamecenter/{game_id}/play-by-play", self.base_url);
        let raw: PlayByPlayResponse = self.get(&url).await?;
        Ok(map_play_by_play(game_id, raw))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_owned(),
                status,
                body: snippet(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(BODY_SNIPPET_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Mapping: NHL wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_schedule(raw: ScheduleResponse) -> Vec<GameRef> {
    let mut games = Vec::new();
    for day in raw.game_week {
        let Some(date) = day
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            debug!("dropping schedule day with unusable date {:?}", day.date);
            continue;
        };
        for game in day.games {
            match game.id {
                Some(id) => games.push(GameRef { id, date }),
                None => debug!("dropping game without id on {date}"),
            }
        }
    }
    games
}

fn map_play_by_play(game_id: u64, raw: PlayByPlayResponse) -> GameFeed {
    if let Some(id) = raw.id
        && id != game_id
    {
        debug!("play-by-play for {game_id} reports game id {id}");
    }

    GameFeed {
        game_id,
        home: map_team(raw.home_team.as_ref(), HOME_TEAM_FALLBACK),
        away: map_team(raw.away_team.as_ref(), AWAY_TEAM_FALLBACK),
        venue: localized(raw.venue.as_ref()).unwrap_or_else(|| VENUE_FALLBACK.to_owned()),
        plays: raw.plays.into_iter().map(map_play).collect(),
    }
}

fn map_team(team: Option<&NhleTeam>, fallback: &str) -> Team {
    let Some(team) = team else {
        return Team { id: None, name: fallback.to_owned() };
    };
    let name = localized(team.name.as_ref())
        .or_else(|| localized(team.common_name.as_ref()))
        .unwrap_or_else(|| fallback.to_owned());
    Team { id: team.id, name }
}

fn localized(name: Option<&LocalizedName>) -> Option<String> {
    name.and_then(|n| n.default.clone())
}

fn map_play(play: NhlePlay) -> PlayEvent {
    PlayEvent {
        event_id: play.event_id,
        period: play.period_descriptor.and_then(|p| p.number),
        time_in_period: play.time_in_period,
        type_desc_key: play.type_desc_key,
        owner_team_id: play.details.and_then(|d| d.event_owner_team_id),
    }
}
