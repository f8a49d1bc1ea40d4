use crate::document::transform;
use crate::index::{BulkReport, BulkSink, DocumentBatch, IndexError};
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use nhl_api::client::NhlApi;
use nhl_api::schedule::ScheduleWalker;
use nhl_api::{DateRange, GameFeed, GameRef};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub range: DateRange,
    pub game_filter: Option<u64>,
    /// Play-by-play fetches in flight at once within a day.
    pub concurrency: usize,
}

/// Counters for everything the walk saw before loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub days_scanned: usize,
    pub days_failed: usize,
    pub games_processed: usize,
    pub games_failed: usize,
    /// Plays turned into documents.
    pub plays_read: usize,
    pub events_skipped: usize,
    /// Distinct identity keys handed to the sink.
    pub documents: usize,
}

#[derive(Debug)]
pub struct RunSummary {
    pub stats: WalkStats,
    pub load: Result<BulkReport, IndexError>,
}

/// Schedule → play-by-play → documents → one load into the sink.
pub struct Pipeline {
    api: NhlApi,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(api: NhlApi, options: PipelineOptions) -> Self {
        Self { api, options }
    }

    /// Walk the whole range, then hand every collected document to `sink`.
    ///
    /// Failed days, games, and malformed plays are logged and skipped; only
    /// the load itself can fail the run.
    pub async fn run<S: BulkSink>(&self, sink: &S) -> RunSummary {
        let range = self.options.range;
        info!(
            "scanning {} days from {}{}",
            range.len(),
            range.start(),
            self.options
                .game_filter
                .map(|id| format!(" for game {id}"))
                .unwrap_or_default()
        );

        let mut stats = WalkStats::default();
        let mut batch = DocumentBatch::new();
        let mut fetched: HashSet<GameRef> = HashSet::new();

        let days = ScheduleWalker::new(&self.api, range, self.options.game_filter).into_stream();
        let mut days = std::pin::pin!(days);

        while let Some(day) = days.next().await {
            stats.days_scanned += 1;
            let games = match day.result {
                Ok(games) => games,
                Err(e) => {
                    warn!("skipping schedule for {}: {e}", day.date);
                    stats.days_failed += 1;
                    continue;
                }
            };

            // The schedule answers with a whole week, so the same listing shows
            // up again on the following days. A game listed under another date
            // is a new listing with its own timestamps.
            let fresh: Vec<GameRef> = games.into_iter().filter(|g| fetched.insert(*g)).collect();
            debug!("{}: {} new games", day.date, fresh.len());

            let mut feeds = stream::iter(fresh)
                .map(|game| async move { (game, self.api.fetch_play_by_play(game.id).await) })
                .buffer_unordered(self.options.concurrency.max(1));

            while let Some((game, result)) = feeds.next().await {
                println!("{}", progress_line(&game));
                match result {
                    Ok(feed) => accumulate(game, &feed, &mut batch, &mut stats),
                    Err(e) => {
                        warn!("skipping game {}: {e}", game.id);
                        stats.games_failed += 1;
                    }
                }
            }
        }

        stats.documents = batch.len();
        info!(
            "walk complete: {} games, {} plays, {} documents ({} days and {} games skipped)",
            stats.games_processed, stats.plays_read, stats.documents, stats.days_failed, stats.games_failed
        );

        let load = sink.load(batch).await;
        RunSummary { stats, load }
    }
}

fn progress_line(game: &GameRef) -> String {
    format!("Processing game {} on {}", game.id, game.date)
}

fn accumulate(game: GameRef, feed: &GameFeed, batch: &mut DocumentBatch, stats: &mut WalkStats) {
    let context = feed.context(game.date);
    for event in &feed.plays {
        match transform(event, &context) {
            Ok(document) => {
                stats.plays_read += 1;
                if batch.insert(document) {
                    debug!("game {}: play {:?} shares a timestamp with an earlier play", game.id, event.event_id);
                }
            }
            Err(e) => {
                warn!("game {}: skipping play: {e}", game.id);
                stats.events_skipped += 1;
            }
        }
    }
    stats.games_processed += 1;
}
