//! Timestamps, time ranges and epoch conversion.
//!
//! Traces are recorded against different clocks. A timestamp is either real
//! (wall clock, nanoseconds since the Unix epoch) or elapsed (monotonic since
//! boot, no epoch). Decoders that know the real-to-elapsed offset of their
//! device produce real timestamps through a [`TimestampConverter`].

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampKind {
    Real,
    Elapsed,
}

/// Clock a decoder read its raw values from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    #[default]
    Elapsed,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub kind: TimestampKind,
    pub value_ns: i64,
}

impl Timestamp {
    pub fn real(value_ns: i64) -> Self {
        Self {
            kind: TimestampKind::Real,
            value_ns,
        }
    }

    pub fn elapsed(value_ns: i64) -> Self {
        Self {
            kind: TimestampKind::Elapsed,
            value_ns,
        }
    }

    pub fn is_real(&self) -> bool {
        self.kind == TimestampKind::Real
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value_ns
            .cmp(&other.value_ns)
            .then_with(|| (self.kind as u8).cmp(&(other.kind as u8)))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TimestampKind::Real => write!(
                f,
                "{}",
                Utc.timestamp_nanos(self.value_ns)
                    .format("%Y-%m-%dT%H:%M:%S%.9f")
            ),
            TimestampKind::Elapsed => f.write_str(&format_elapsed_ns(self.value_ns)),
        }
    }
}

/// Render a nanosecond duration as `1h2m3s4ms5ns`, skipping zero units
pub fn format_elapsed_ns(value_ns: i64) -> String {
    const UNITS: [(&str, i64); 5] = [
        ("h", 3_600_000_000_000),
        ("m", 60_000_000_000),
        ("s", 1_000_000_000),
        ("ms", 1_000_000),
        ("ns", 1),
    ];

    if value_ns == 0 {
        return "0ns".to_string();
    }

    let mut out = String::new();
    if value_ns < 0 {
        out.push('-');
    }
    let mut rest = value_ns.unsigned_abs();
    for (unit, size) in UNITS {
        let size = size as u64;
        let count = rest / size;
        if count > 0 {
            out.push_str(&format!("{count}{unit}"));
            rest %= size;
        }
    }
    out
}

/// Closed range between two timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl TimeRange {
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { from, to }
    }

    pub fn duration_ns(&self) -> i64 {
        self.to.value_ns.saturating_sub(self.from.value_ns)
    }

    pub fn duration_string(&self) -> String {
        format_elapsed_ns(self.duration_ns())
    }
}

/// Turns raw decoder values into timestamps, applying the offset shared by
/// every trace of the current load.
#[derive(Debug, Clone, Default)]
pub struct TimestampConverter {
    real_to_elapsed_offset_ns: Option<i64>,
}

impl TimestampConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_real_to_elapsed_offset_ns(&mut self, offset_ns: i64) {
        self.real_to_elapsed_offset_ns = Some(offset_ns);
    }

    pub fn real_to_elapsed_offset_ns(&self) -> Option<i64> {
        self.real_to_elapsed_offset_ns
    }

    /// Elapsed values become real when the decoder reported an offset for its
    /// device; the load-wide offset takes precedence over the decoder's own.
    pub fn make_timestamp(&self, raw_ns: i64, base: TimeBase, own_offset_ns: Option<i64>) -> Timestamp {
        match base {
            TimeBase::Real => Timestamp::real(raw_ns),
            TimeBase::Elapsed => match own_offset_ns {
                Some(own) => {
                    let offset = self.real_to_elapsed_offset_ns.unwrap_or(own);
                    Timestamp::real(raw_ns.saturating_add(offset))
                }
                None => Timestamp::elapsed(raw_ns),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed_ns(0), "0ns");
        assert_eq!(format_elapsed_ns(5 * 60 * 1_000_000_000 + 10), "5m10ns");
        assert_eq!(format_elapsed_ns(-1_000_000), "-1ms");
    }

    #[test]
    fn test_real_timestamp_display() {
        assert_eq!(
            Timestamp::real(1_500_000_000).to_string(),
            "1970-01-01T00:00:01.500000000"
        );
    }

    #[test]
    fn test_converter_prefers_load_wide_offset() {
        let mut converter = TimestampConverter::new();
        assert_eq!(
            converter.make_timestamp(10, TimeBase::Elapsed, Some(100)),
            Timestamp::real(110)
        );

        converter.set_real_to_elapsed_offset_ns(1_000);
        assert_eq!(
            converter.make_timestamp(10, TimeBase::Elapsed, Some(100)),
            Timestamp::real(1_010)
        );
        assert_eq!(
            converter.make_timestamp(10, TimeBase::Elapsed, None),
            Timestamp::elapsed(10)
        );
        assert_eq!(
            converter.make_timestamp(10, TimeBase::Real, None),
            Timestamp::real(10)
        );
    }

    #[test]
    fn test_ordering_uses_value_first() {
        assert!(Timestamp::elapsed(1) < Timestamp::real(2));
        assert!(Timestamp::real(3) > Timestamp::elapsed(2));
    }
}
