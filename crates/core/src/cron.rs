//! Five-field cron expressions.
//!
//! Expressions use the classic `minute hour day-of-month month day-of-week`
//! layout. Seconds fields and `@nickname` shorthands are rejected so that
//! every stored schedule means the same thing to the scheduler and to any
//! external crontab tooling.

use chrono::{DateTime, FixedOffset, TimeZone};
use croner::Cron;
use serde::Serialize;

use crate::error::CoreError;

/// Number of whitespace-separated fields in an accepted expression.
pub const CRON_FIELD_COUNT: usize = 5;

/// A validated cron expression.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    cron: Cron,
}

impl CronSchedule {
    /// Parse and validate a five-field expression.
    pub fn parse(expression: &str) -> Result<Self, CoreError> {
        let expression = expression.split_whitespace().collect::<Vec<_>>().join(" ");
        let fields = expression.split(' ').filter(|f| !f.is_empty()).count();
        if fields != CRON_FIELD_COUNT {
            return Err(CoreError::Validation(format!(
                "Cron expression '{expression}' must have {CRON_FIELD_COUNT} fields, found {fields}"
            )));
        }

        let cron = Cron::new(&expression).parse().map_err(|e| {
            CoreError::Validation(format!("Invalid cron expression '{expression}': {e}"))
        })?;

        Ok(Self { expression, cron })
    }

    /// The expression with whitespace collapsed to single spaces.
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// First occurrence strictly after `after`, in `after`'s time zone.
    ///
    /// `None` when the expression can never fire again (e.g. `0 0 31 2 *`).
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.cron.find_next_occurrence(after, false).ok()
    }
}

/// Check syntax only.
pub fn validate_cron(expression: &str) -> Result<(), CoreError> {
    CronSchedule::parse(expression).map(|_| ())
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// One tick of the next-fire countdown stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Countdown {
    pub next_run: DateTime<FixedOffset>,
    pub seconds_remaining: i64,
    pub human_readable: String,
    /// True only on the tick where the countdown reaches zero.
    pub sync_run: bool,
}

/// Compute the countdown to the next fire of `schedule` as seen at `now`.
pub fn countdown<Tz: TimeZone>(schedule: &CronSchedule, now: &DateTime<Tz>) -> Option<Countdown> {
    let next_run = schedule.next_after(now)?;
    let seconds_remaining = next_run
        .clone()
        .signed_duration_since(now.clone())
        .num_seconds()
        .max(0);

    Some(Countdown {
        next_run: next_run.fixed_offset(),
        seconds_remaining,
        human_readable: format_remaining(seconds_remaining),
        sync_run: seconds_remaining == 0,
    })
}

/// Render a second count as `1d 2h 3m 4s`, dropping leading zero units.
pub fn format_remaining(total_secs: i64) -> String {
    let total = total_secs.max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

/// Order items by their next fire time after `now`. Items whose expression
/// does not parse, or never fires again, sort last.
pub fn sort_by_next_fire<T, Tz, F>(items: &mut [T], now: &DateTime<Tz>, cron_of: F)
where
    Tz: TimeZone,
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| {
        CronSchedule::parse(cron_of(item))
            .ok()
            .and_then(|schedule| schedule.next_after(now))
            .map(|next| (0u8, next.timestamp()))
            .unwrap_or((1, i64::MAX))
    });
}
