//! Time handling: output time series, frequencies and nearest-time selection.

use chrono::{Duration, NaiveDateTime};

use crate::error::{CmipError, CmipResult};

/// Format of the ETL window bounds in the run configuration.
pub const ETL_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Parse an ETL bound such as `202001010000`.
pub fn parse_etl_timestamp(s: &str) -> CmipResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), ETL_TIMESTAMP_FORMAT)
        .map_err(|e| CmipError::InvalidTime(format!("'{}': {}", s, e)))
}

/// WRF intermediate header date, e.g. `2020-01-01_06:00:00:0000`.
pub fn hdate(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d_%H:%M:%S:0000").to_string()
}

/// Output file stamp, e.g. `2020-01-01_06`.
pub fn file_stamp(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d_%H").to_string()
}

/// Sampling frequency of a variable group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Uniform step.
    Fixed(Duration),
    /// Monthly means; not a fixed step.
    Monthly,
}

impl Frequency {
    /// Parse a pandas-style frequency (`6H`, `3h`, `1D`, `30min`, `1M`).
    ///
    /// A `*` marker (used in the metadata table to flag the output
    /// frequency) is ignored.
    pub fn parse(s: &str) -> CmipResult<Self> {
        let cleaned = s.trim().trim_matches('*');
        let split = cleaned
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CmipError::InvalidFrequency(s.to_string()))?;
        let (count, unit) = cleaned.split_at(split);
        let count: i64 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| CmipError::InvalidFrequency(s.to_string()))?
        };
        if count <= 0 {
            return Err(CmipError::InvalidFrequency(s.to_string()));
        }

        match unit {
            "H" | "h" => Ok(Frequency::Fixed(Duration::hours(count))),
            "D" | "d" => Ok(Frequency::Fixed(Duration::days(count))),
            "T" | "min" => Ok(Frequency::Fixed(Duration::minutes(count))),
            "M" | "MS" if count == 1 => Ok(Frequency::Monthly),
            _ => Err(CmipError::InvalidFrequency(s.to_string())),
        }
    }

    /// The fixed step, if any.
    pub fn step(&self) -> Option<Duration> {
        match self {
            Frequency::Fixed(step) => Some(*step),
            Frequency::Monthly => None,
        }
    }
}

/// Strictly increasing, fixed-step sequence of output timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeries {
    times: Vec<NaiveDateTime>,
}

impl TimeSeries {
    /// All timestamps `start, start + step, ...` not later than `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, step: Duration) -> CmipResult<Self> {
        if step <= Duration::zero() {
            return Err(CmipError::InvalidFrequency(format!(
                "step must be positive, got {}",
                step
            )));
        }
        if end < start {
            return Err(CmipError::InvalidTime(format!(
                "end {} is before start {}",
                end, start
            )));
        }

        let mut times = Vec::new();
        let mut current = start;
        while current <= end {
            times.push(current);
            current += step;
        }
        Ok(Self { times })
    }

    pub fn as_slice(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.times.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Index of the time closest to `target` (smallest absolute difference).
///
/// Ties resolve to the earlier index. Returns `None` for an empty axis.
pub fn nearest_time_index(times: &[NaiveDateTime], target: NaiveDateTime) -> Option<usize> {
    let mut best: Option<(usize, Duration)> = None;
    for (idx, t) in times.iter().enumerate() {
        let diff = if *t >= target { *t - target } else { target - *t };
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((idx, diff)),
        }
    }
    best.map(|(idx, _)| idx)
}
