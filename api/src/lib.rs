pub mod client;
pub mod nhle;
pub mod schedule;

use chrono::{Days, NaiveDate};

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the NHL wire format
// ---------------------------------------------------------------------------

/// Days covered by one ingestion run: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// January 1 of `season`, extended by `days` calendar days.
    pub fn for_season(season: i32, days: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(season, 1, 1)?;
        let end = start.checked_add_days(Days::new(u64::from(days)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> u64 {
        (self.end - self.start).num_days().unsigned_abs()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Walk the range one calendar day at a time.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day < end)
    }
}

/// A game listed on one day of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameRef {
    pub id: u64,
    pub date: NaiveDate,
}

impl GameRef {
    /// `None` means no filter: every game matches.
    pub fn matches(&self, filter: Option<u64>) -> bool {
        filter.is_none_or(|id| id == self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub id: Option<i64>,
    pub name: String, // "Toronto Maple Leafs"
}

/// Game-level facts shared by every play of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameContext {
    pub game_id: u64,
    pub home: Team,
    pub away: Team,
    pub venue: String,
    /// Scheduled date; play timestamps are offsets from its midnight.
    pub date: NaiveDate,
}

/// One raw play. Fields stay optional as on the wire; validation is left to
/// whoever turns plays into documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayEvent {
    pub event_id: Option<u64>,
    pub period: Option<u32>,
    pub time_in_period: Option<String>,
    pub type_desc_key: Option<String>,
    pub owner_team_id: Option<i64>,
}

/// Play-by-play payload for one game.
#[derive(Debug, Clone, Default)]
pub struct GameFeed {
    pub game_id: u64,
    pub home: Team,
    pub away: Team,
    pub venue: String,
    pub plays: Vec<PlayEvent>,
}

impl GameFeed {
    pub fn context(&self, date: NaiveDate) -> GameContext {
        GameContext {
            game_id: self.game_id,
            home: self.home.clone(),
            away: self.away.clone(),
            venue: self.venue.clone(),
            date,
        }
    }
}
