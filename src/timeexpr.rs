//! Time range resolution.
//!
//! Understands relative expressions such as `now-1h` or `now-7d/d`, RFC 3339
//! instants and epoch milliseconds.

use crate::models::RangeBound;

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Resolves a range boundary to an absolute instant.
pub trait TimeResolver: Send + Sync {
    /// `None` when the boundary cannot be interpreted.
    fn resolve(&self, bound: &RangeBound) -> Option<DateTime<Utc>>;
}

/// Date-math resolver. Uses the wall clock unless pinned with [`DateMath::at`].
#[derive(Debug, Clone, Default)]
pub struct DateMath {
    now: Option<DateTime<Utc>>,
}

impl DateMath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative expressions against a fixed instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn parse_expr(&self, expr: &str) -> Option<DateTime<Utc>> {
        let expr = expr.trim();
        if let Some(ops) = expr.strip_prefix("now") {
            return apply_ops(self.now(), ops);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
            return Some(dt.with_timezone(&Utc));
        }
        expr.parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

impl TimeResolver for DateMath {
    fn resolve(&self, bound: &RangeBound) -> Option<DateTime<Utc>> {
        match bound {
            RangeBound::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RangeBound::Expr(expr) => self.parse_expr(expr),
        }
    }
}

fn op_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([+-]\d*|/)([smhdwMy])").unwrap())
}

/// Apply `+N<unit>`, `-N<unit>` and `/<unit>` operations left to right.
fn apply_ops(mut time: DateTime<Utc>, ops: &str) -> Option<DateTime<Utc>> {
    let mut consumed = 0;

    for caps in op_regex().captures_iter(ops) {
        let whole = caps.get(0)?;
        if whole.start() != consumed {
            return None;
        }
        consumed = whole.end();

        let op = &caps[1];
        let unit = caps[2].chars().next()?;

        time = if op == "/" {
            round_down(time, unit)?
        } else {
            let digits = &op[1..];
            let amount: i64 = if digits.is_empty() { 1 } else { digits.parse().ok()? };
            let amount = if op.starts_with('-') { -amount } else { amount };
            shift(time, amount, unit)?
        };
    }

    if consumed != ops.len() {
        return None;
    }
    Some(time)
}

fn shift(time: DateTime<Utc>, amount: i64, unit: char) -> Option<DateTime<Utc>> {
    let months = match unit {
        's' => return time.checked_add_signed(Duration::try_seconds(amount)?),
        'm' => return time.checked_add_signed(Duration::try_minutes(amount)?),
        'h' => return time.checked_add_signed(Duration::try_hours(amount)?),
        'd' => return time.checked_add_signed(Duration::try_days(amount)?),
        'w' => return time.checked_add_signed(Duration::try_weeks(amount)?),
        'M' => amount,
        'y' => amount.checked_mul(12)?,
        _ => return None,
    };

    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        time.checked_add_months(magnitude)
    } else {
        time.checked_sub_months(magnitude)
    }
}

fn round_down(time: DateTime<Utc>, unit: char) -> Option<DateTime<Utc>> {
    let secs = time.timestamp();
    let floor = |step: i64| Utc.timestamp_opt(secs - secs.rem_euclid(step), 0).single();

    match unit {
        's' => floor(1),
        'm' => floor(60),
        'h' => floor(3600),
        'd' => floor(86400),
        'w' => {
            let start_of_day = floor(86400)?;
            let back = i64::from(start_of_day.weekday().num_days_from_monday());
            start_of_day.checked_sub_signed(Duration::try_days(back)?)
        }
        'M' => {
            let date = time.date_naive().with_day(1)?;
            Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
        }
        'y' => {
            let date = time.date_naive().with_day(1)?.with_month(1)?;
            Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
        }
        _ => None,
    }
}

/// Resolve a boundary to epoch milliseconds, falling back to 0.
pub fn resolve_millis(resolver: &dyn TimeResolver, bound: &RangeBound) -> i64 {
    match resolver.resolve(bound) {
        // Sub-millisecond remainders round up.
        Some(dt) => {
            let ms = dt.timestamp_millis();
            if dt.timestamp_subsec_nanos() % 1_000_000 > 0 {
                ms + 1
            } else {
                ms
            }
        }
        None => {
            tracing::warn!("Could not resolve time expression {:?}; using epoch 0", bound.to_string());
            0
        }
    }
}
