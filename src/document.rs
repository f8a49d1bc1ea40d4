use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use nhl_api::{GameContext, PlayEvent};
use serde::Serialize;
use std::fmt;

/// Every period counts as a 20-minute block, overtime included. Stored
/// timestamps depend on this, so shorter overtime periods are not special-cased.
pub const PERIOD_MINUTES: u32 = 20;

/// Team attribution for plays that carry no owning team.
pub const UNKNOWN_TEAM: &str = "unknown";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One play as stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayDocument {
    pub timestamp: String,
    pub teamid: Option<i64>,
    pub teamnick: String,
    pub teamnick_opposing: String,
    pub play_id: u64,
    pub period: u32,
    pub time: String,
    pub description: Option<String>,
    pub game: GameRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub date: String,
    pub location: String,
}

impl PlayDocument {
    /// Document id in the index. Re-ingesting the same play overwrites it.
    pub fn identity_key(&self) -> String {
        format!("{}:{}", self.game.id, self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedEventError {
    MissingEventId,
    MissingPeriod { play_id: u64 },
    InvalidPeriod { play_id: u64, period: u32 },
    MissingTime { play_id: u64 },
    InvalidTime { play_id: u64, time: String },
}

impl fmt::Display for MalformedEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEventId => write!(f, "play has no event id"),
            Self::MissingPeriod { play_id } => write!(f, "play {play_id} has no period number"),
            Self::InvalidPeriod { play_id, period } => {
                write!(f, "play {play_id} has invalid period {period}")
            }
            Self::MissingTime { play_id } => write!(f, "play {play_id} has no time in period"),
            Self::InvalidTime { play_id, time } => {
                write!(f, "play {play_id} has time {time:?}, expected MM:SS")
            }
        }
    }
}

impl std::error::Error for MalformedEventError {}

/// Turn one raw play into its index document.
///
/// The timestamp is the game date at midnight plus the elapsed game time:
/// `MM + (period - 1) * 20` minutes and `SS` seconds.
pub fn transform(event: &PlayEvent, game: &GameContext) -> Result<PlayDocument, MalformedEventError> {
    let play_id = event.event_id.ok_or(MalformedEventError::MissingEventId)?;
    let period = event.period.ok_or(MalformedEventError::MissingPeriod { play_id })?;
    let time = event
        .time_in_period
        .as_deref()
        .ok_or(MalformedEventError::MissingTime { play_id })?;
    let (minutes, seconds) = parse_time_in_period(time).ok_or_else(|| MalformedEventError::InvalidTime {
        play_id,
        time: time.to_owned(),
    })?;
    let timestamp = play_timestamp(game, period, minutes, seconds)
        .ok_or(MalformedEventError::InvalidPeriod { play_id, period })?;

    let (teamid, teamnick, teamnick_opposing) = match event.owner_team_id {
        Some(owner) if game.home.id == Some(owner) => {
            (Some(owner), game.home.name.clone(), game.away.name.clone())
        }
        Some(owner) => (Some(owner), game.away.name.clone(), game.home.name.clone()),
        None => (None, UNKNOWN_TEAM.to_owned(), UNKNOWN_TEAM.to_owned()),
    };

    Ok(PlayDocument {
        timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        teamid,
        teamnick,
        teamnick_opposing,
        play_id,
        period,
        time: time.to_owned(),
        description: event.type_desc_key.clone(),
        game: GameRecord {
            id: game.game_id.to_string(),
            home_team: game.home.name.clone(),
            away_team: game.away.name.clone(),
            date: game.date.format("%Y-%m-%d").to_string(),
            location: game.venue.clone(),
        },
    })
}

/// `"MM:SS"` → `(minutes, seconds)`. Minutes may exceed two digits; seconds must be below 60.
pub fn parse_time_in_period(time: &str) -> Option<(u32, u32)> {
    let (minutes, seconds) = time.split_once(':')?;
    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    (seconds < 60).then_some((minutes, seconds))
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Elapsed game minutes at `minutes` into `period`; `None` for period 0.
pub fn elapsed_minutes(period: u32, minutes: u32) -> Option<i64> {
    let completed = i64::from(period.checked_sub(1)?);
    Some(i64::from(minutes) + completed * i64::from(PERIOD_MINUTES))
}

fn play_timestamp(game: &GameContext, period: u32, minutes: u32, seconds: u32) -> Option<NaiveDateTime> {
    let elapsed = TimeDelta::try_minutes(elapsed_minutes(period, minutes)?)?
        .checked_add(&TimeDelta::seconds(i64::from(seconds)))?;
    game.date.and_time(NaiveTime::MIN).checked_add_signed(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nhl_api::Team;

    fn game() -> GameContext {
        GameContext {
            game_id: 2023020500,
            home: Team { id: Some(10), name: "Maple Leafs".into() },
            away: Team { id: Some(6), name: "Bruins".into() },
            venue: "Scotiabank Arena".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn play(period: u32, time: &str, owner: Option<i64>) -> PlayEvent {
        PlayEvent {
            event_id: Some(102),
            period: Some(period),
            time_in_period: Some(time.into()),
            type_desc_key: Some("shot-on-goal".into()),
            owner_team_id: owner,
        }
    }

    #[test]
    fn elapsed_time_adds_twenty_minutes_per_completed_period() {
        assert_eq!(elapsed_minutes(1, 0), Some(0));
        assert_eq!(elapsed_minutes(2, 5), Some(25));
        assert_eq!(elapsed_minutes(3, 19), Some(59));
        assert_eq!(elapsed_minutes(0, 5), None);

        let doc = transform(&play(2, "05:30", Some(10)), &game()).unwrap();
        assert_eq!(doc.timestamp, "2024-01-01T00:25:30");
    }

    #[test]
    fn overtime_periods_count_as_full_twenty_minutes() {
        let doc = transform(&play(4, "03:00", Some(10)), &game()).unwrap();
        assert_eq!(doc.timestamp, "2024-01-01T01:03:00");
        let shootout = transform(&play(5, "00:00", Some(6)), &game()).unwrap();
        assert_eq!(shootout.timestamp, "2024-01-01T01:20:00");
    }

    #[test]
    fn identity_key_is_stable_across_runs() {
        let event = play(1, "00:30", Some(10));
        let first = transform(&event, &game()).unwrap();
        let second = transform(&event, &game()).unwrap();
        assert_eq!(first.identity_key(), "2023020500:2024-01-01T00:00:30");
        assert_eq!(first.identity_key(), second.identity_key());
        assert_eq!(first, second);
    }

    #[test]
    fn home_owner_is_attributed_to_home_team() {
        let doc = transform(&play(1, "00:30", Some(10)), &game()).unwrap();
        assert_eq!(doc.teamid, Some(10));
        assert_eq!(doc.teamnick, "Maple Leafs");
        assert_eq!(doc.teamnick_opposing, "Bruins");
    }

    #[test]
    fn away_owner_is_attributed_to_away_team() {
        let doc = transform(&play(1, "00:30", Some(6)), &game()).unwrap();
        assert_eq!(doc.teamid, Some(6));
        assert_eq!(doc.teamnick, "Bruins");
        assert_eq!(doc.teamnick_opposing, "Maple Leafs");
    }

    #[test]
    fn missing_owner_still_produces_a_document() {
        let doc = transform(&play(3, "10:00", None), &game()).unwrap();
        assert_eq!(doc.teamid, None);
        assert_eq!(doc.teamnick, UNKNOWN_TEAM);
        assert_eq!(doc.teamnick_opposing, UNKNOWN_TEAM);
        assert_eq!(doc.timestamp, "2024-01-01T00:50:00");
        assert_eq!(doc.period, 3);
        assert_eq!(doc.description.as_deref(), Some("shot-on-goal"));
    }

    #[test]
    fn document_carries_game_record() {
        let doc = transform(&play(1, "00:30", Some(10)), &game()).unwrap();
        assert_eq!(doc.play_id, 102);
        assert_eq!(doc.time, "00:30");
        assert_eq!(
            doc.game,
            GameRecord {
                id: "2023020500".into(),
                home_team: "Maple Leafs".into(),
                away_team: "Bruins".into(),
                date: "2024-01-01".into(),
                location: "Scotiabank Arena".into(),
            }
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["game"]["id"], "2023020500");
        assert_eq!(json["teamnick_opposing"], "Bruins");
    }

    #[test]
    fn malformed_events_are_rejected() {
        let ctx = game();
        let no_id = PlayEvent { event_id: None, ..play(1, "00:30", Some(10)) };
        assert_eq!(transform(&no_id, &ctx), Err(MalformedEventError::MissingEventId));

        let no_period = PlayEvent { period: None, ..play(1, "00:30", Some(10)) };
        assert_eq!(transform(&no_period, &ctx), Err(MalformedEventError::MissingPeriod { play_id: 102 }));

        let no_time = PlayEvent { time_in_period: None, ..play(1, "00:30", Some(10)) };
        assert_eq!(transform(&no_time, &ctx), Err(MalformedEventError::MissingTime { play_id: 102 }));

        assert_eq!(
            transform(&play(0, "00:30", Some(10)), &ctx),
            Err(MalformedEventError::InvalidPeriod { play_id: 102, period: 0 })
        );
        for bad in ["", "0030", "5:3x", "05:75", "-1:00", "05:+3"] {
            assert!(
                matches!(transform(&play(1, bad, Some(10)), &ctx), Err(MalformedEventError::InvalidTime { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn time_parsing_accepts_long_minutes() {
        assert_eq!(parse_time_in_period("00:00"), Some((0, 0)));
        assert_eq!(parse_time_in_period("19:59"), Some((19, 59)));
        assert_eq!(parse_time_in_period("125:05"), Some((125, 5)));
    }
}
