use crate::client::{ApiResult, NhlApi};
use crate::{DateRange, GameRef};
use chrono::NaiveDate;
use futures_util::stream::{self, Stream, StreamExt};

/// Result of scanning one day of the schedule.
///
/// A failed day is reported as a value so the walk can carry on with the
/// next day; the stream itself never ends early.
#[derive(Debug)]
pub struct DayOutcome {
    pub date: NaiveDate,
    pub result: ApiResult<Vec<GameRef>>,
}

/// Walks a date range, one schedule request per day, in order.
#[derive(Debug, Clone)]
pub struct ScheduleWalker<'a> {
    api: &'a NhlApi,
    range: DateRange,
    filter: Option<u64>,
}

impl<'a> ScheduleWalker<'a> {
    pub fn new(api: &'a NhlApi, range: DateRange, filter: Option<u64>) -> Self {
        Self { api, range, filter }
    }

    /// Lazily fetch each day. With a game filter set, only matching games are
    /// yielded but every day of the range is still requested: the schedule can
    /// list the same game under more than one requested date, so finding it
    /// once does not end the scan.
    pub fn into_stream(self) -> impl Stream<Item = DayOutcome> + 'a {
        let Self { api, range, filter } = self;
        stream::iter(range.days()).then(move |date| async move {
            let result = api
                .fetch_schedule(date)
                .await
                .map(|games| games.into_iter().filter(|g| g.matches(filter)).collect());
            DayOutcome { date, result }
        })
    }
}
