//! Monotonic time sources and swim time formatting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;

use crate::error::{CoreError, Result};

/// A monotonic millisecond source.
///
/// Values only need to be comparable with each other; the origin is arbitrary.
pub trait TimeSource {
    /// Milliseconds since the source's origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Wall-clock independent source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A source that only moves when told to.
///
/// Clones share the same counter, so a test (or a replay driver) can hold one
/// handle while a heat session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Arc<AtomicU64>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jumps to an absolute reading. Readings earlier than the current one are ignored.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Formats milliseconds as a swim time: `m:ss,cc`, or `ss,cc` under a minute.
///
/// Hundredths are truncated, matching what a stopwatch display shows.
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let hundredths = (ms % 1000) / 10;
    if minutes > 0 {
        format!("{minutes}:{seconds:02},{hundredths:02}")
    } else {
        format!("{seconds:02},{hundredths:02}")
    }
}

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d{1,3}):)?(\d{1,2})(?:[.,](\d{1,3}))?s?$").expect("time pattern is valid")
});

/// Parses a formatted swim time back into milliseconds.
///
/// Accepts `m:ss,cc`, `m:ss.cc`, `ss,cc` and `ss.cc`, with an optional trailing
/// `s`. A fraction of one, two or three digits is read as tenths, hundredths or
/// milliseconds.
pub fn parse_time(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let caps = TIME_RE
        .captures(trimmed)
        .ok_or_else(|| CoreError::malformed("time", text))?;

    let number = |idx: usize| -> Result<u64> {
        caps.get(idx).map_or(Ok(0), |m| {
            m.as_str()
                .parse::<u64>()
                .map_err(|_| CoreError::malformed("time", text))
        })
    };

    let minutes = number(1)?;
    let seconds = number(2)?;
    if caps.get(1).is_some() && seconds >= 60 {
        return Err(CoreError::malformed("time", text));
    }
    let fraction_ms = match caps.get(3).map(|m| m.as_str().len()) {
        Some(1) => number(3)? * 100,
        Some(2) => number(3)? * 10,
        Some(_) => number(3)?,
        None => 0,
    };

    Ok(minutes * 60_000 + seconds * 1000 + fraction_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_under_a_minute() {
        assert_eq!(format_time(58_320), "58,32");
        assert_eq!(format_time(0), "00,00");
        assert_eq!(format_time(5_009), "05,00");
    }

    #[test]
    fn format_time_with_minutes() {
        assert_eq!(format_time(61_200), "1:01,20");
        assert_eq!(format_time(60_950), "1:00,95");
        assert_eq!(format_time(754_990), "12:34,99");
    }

    #[test]
    fn parse_time_accepts_document_formats() {
        assert_eq!(parse_time("58,32").unwrap(), 58_320);
        assert_eq!(parse_time("1:01,20").unwrap(), 61_200);
        assert_eq!(parse_time("01:01.20").unwrap(), 61_200);
        assert_eq!(parse_time("1:00,95s").unwrap(), 60_950);
        assert_eq!(parse_time("00:00,00").unwrap(), 0);
        assert_eq!(parse_time(" 29.5 ").unwrap(), 29_500);
        assert_eq!(parse_time("29.512").unwrap(), 29_512);
    }

    #[test]
    fn parse_time_inverts_format_time() {
        for ms in [0, 10, 58_320, 61_200, 754_990] {
            assert_eq!(parse_time(&format_time(ms)).unwrap(), ms);
        }
    }

    #[test]
    fn parse_time_rejects_garbage() {
        assert!(parse_time("").is_err());
        assert!(parse_time("DQ").is_err());
        assert!(parse_time("1:75,00").is_err());
        assert!(parse_time("1:2:3").is_err());
    }

    #[test]
    fn manual_time_is_shared_and_monotonic() {
        let time = ManualTime::new();
        let handle = time.clone();
        handle.advance(1_500);
        assert_eq!(time.now_ms(), 1_500);
        handle.set(1_000);
        assert_eq!(time.now_ms(), 1_500);
        handle.set(2_000);
        assert_eq!(time.now_ms(), 2_000);
    }

    #[test]
    fn monotonic_time_never_goes_backwards() {
        let time = MonotonicTime::new();
        let first = time.now_ms();
        let second = time.now_ms();
        assert!(second >= first);
    }
}
