use serde_json::{Value, json};

/// Index body for play documents: keyword fields for exact-match filtering,
/// dates for the play timestamp and game date.
pub fn play_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "timestamp": { "type": "date" },
                "teamid": { "type": "integer" },
                "teamnick": { "type": "keyword" },
                "teamnick_opposing": { "type": "keyword" },
                "play_id": { "type": "integer" },
                "period": { "type": "integer" },
                "time": { "type": "keyword" },
                "description": { "type": "keyword" },
                "game": {
                    "properties": {
                        "id": { "type": "keyword" },
                        "home_team": { "type": "keyword" },
                        "away_team": { "type": "keyword" },
                        "date": { "type": "date" },
                        "location": { "type": "keyword" }
                    }
                }
            }
        }
    })
}
