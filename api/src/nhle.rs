/// NHL web API raw wire types: serde shapes for deserializing api-web.nhle.com responses.
/// These map to our clean domain types via the mapping functions in client.rs.
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Schedule  (GET /schedule/{YYYY-MM-DD})
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    /// One entry per calendar day; the endpoint answers with the whole week
    /// starting at the requested date.
    #[serde(default)]
    pub game_week: Vec<GameDay>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct GameDay {
    pub date: Option<String>, // "2024-01-01"
    #[serde(default)]
    pub games: Vec<ScheduledGame>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScheduledGame {
    pub id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Play-by-play  (GET /gamecenter/{game_id}/play-by-play)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlayByPlayResponse {
    pub id: Option<u64>,
    #[serde(default)]
    pub plays: Vec<NhlePlay>,
    pub home_team: Option<NhleTeam>,
    pub away_team: Option<NhleTeam>,
    pub venue: Option<LocalizedName>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NhleTeam {
    pub id: Option<i64>,
    pub name: Option<LocalizedName>,
    /// Newer payloads carry `commonName` instead of `name`.
    pub common_name: Option<LocalizedName>,
}

/// Localized string object: `{"default": "...", "fr": "..."}`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LocalizedName {
    pub default: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NhlePlay {
    pub event_id: Option<u64>,
    pub period_descriptor: Option<PeriodDescriptor>,
    pub time_in_period: Option<String>, // "05:30", elapsed within the period
    pub type_desc_key: Option<String>,  // "faceoff", "shot-on-goal", ...
    pub details: Option<PlayDetails>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDescriptor {
    pub number: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlayDetails {
    pub event_owner_team_id: Option<i64>,
}
