//! Clock formatting and the periodic display tick.

use std::{rc::Rc, time::Duration};

use chrono::{DateTime, Utc};
use futures::{stream, Stream};
use pitwall_host::Sleeper;

/// Period of the status-bar tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Elapsed time as `HH:MM:SS`; hours keep counting past 99.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Unix milliseconds as a `HH:MM:SS` UTC wall-clock time.
pub fn format_timestamp(unix_ms: u64) -> String {
    i64::try_from(unix_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Endless stream that yields once per `period`.
///
/// Consumers only read the clock on each tick; the stream itself carries no state beyond a
/// counter.
pub fn ticks(sleeper: Rc<dyn Sleeper>, period: Duration) -> impl Stream<Item = u64> {
    stream::unfold(0_u64, move |count| {
        let sleep = sleeper.sleep(period);
        async move {
            sleep.await;
            let next = count.wrapping_add(1);
            Some((next, next))
        }
    })
}
