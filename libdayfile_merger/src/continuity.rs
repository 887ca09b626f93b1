//! Continuity decisions between consecutive raw files.
//!
//! Decisions only ever consider file starts and the single following file. A logger outage
//! inside one file is absorbed into the buffer as if the data were continuous.
use time::{Date, OffsetDateTime};

use super::constants::EPSILON;

/// Where a newly read segment goes relative to the open buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// No buffer is open; the segment starts a new day-file
    Seed,
    /// The segment continues after the end of the buffer
    Append,
    /// The segment overlaps the buffer tail, which must be trimmed first
    TrimAppend,
    /// The segment lies entirely within data already buffered
    Skip,
}

/// What the following file means for the open buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Next file continues the buffer
    Continue,
    /// Next file starts after a gap on the same day
    Gap,
    /// Next file starts on a different UTC day
    NewDay,
    /// There is no next file
    EndOfStack,
}

impl Boundary {
    /// Whether the open buffer must be flushed
    pub fn is_incomplete(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Decide how a segment spanning `[start, end)` joins a buffer whose last sample is at `buffer_last`
pub fn place_segment(buffer_last: Option<f64>, start: f64, end: f64) -> Placement {
    match buffer_last {
        None => Placement::Seed,
        Some(last) if end < last => Placement::Skip,
        // A segment starting exactly on the last buffered sample also overlaps
        Some(last) if last - start > -EPSILON => Placement::TrimAppend,
        Some(_) => Placement::Append,
    }
}

/// Inspect the next file's start against the current file's start and exclusive end
pub fn look_ahead(
    current_start: f64,
    current_end: f64,
    next_start: Option<f64>,
) -> Result<Boundary, time::error::ComponentRange> {
    let next_start = match next_start {
        Some(t) => t,
        None => return Ok(Boundary::EndOfStack),
    };

    if utc_date(next_start)? != utc_date(current_start)? {
        Ok(Boundary::NewDay)
    } else if next_start - current_end > EPSILON {
        Ok(Boundary::Gap)
    } else {
        Ok(Boundary::Continue)
    }
}

/// File index for the buffer opened after `boundary`
pub fn next_file_index(boundary: Boundary, file_index: u32) -> u32 {
    match boundary {
        Boundary::Continue | Boundary::EndOfStack => file_index,
        Boundary::Gap => file_index + 1,
        Boundary::NewDay => 0,
    }
}

/// UTC calendar date of an epoch time
pub fn utc_date(epoch_seconds: f64) -> Result<Date, time::error::ComponentRange> {
    Ok(OffsetDateTime::from_unix_timestamp(epoch_seconds.floor() as i64)?.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2013-06-12T00:00:00Z
    const DAY_START: f64 = 1_370_995_200.0;

    #[test]
    fn test_placement() {
        assert_eq!(place_segment(None, 10.0, 20.0), Placement::Seed);
        // Buffer ends with a sample at 19, next sample due at 20
        assert_eq!(place_segment(Some(19.0), 20.0, 30.0), Placement::Append);
        assert_eq!(place_segment(Some(19.0), 25.0, 30.0), Placement::Append);
        assert_eq!(place_segment(Some(19.0), 15.0, 25.0), Placement::TrimAppend);
        assert_eq!(place_segment(Some(19.0), 19.0, 25.0), Placement::TrimAppend);
        assert_eq!(place_segment(Some(19.0), 12.0, 18.0), Placement::Skip);
    }

    #[test]
    fn test_look_ahead() {
        let start = DAY_START + 3600.0;
        let end = start + 3600.0;
        assert_eq!(look_ahead(start, end, None).unwrap(), Boundary::EndOfStack);
        assert_eq!(look_ahead(start, end, Some(end)).unwrap(), Boundary::Continue);
        assert_eq!(
            look_ahead(start, end, Some(end - 10.0)).unwrap(),
            Boundary::Continue
        );
        assert_eq!(look_ahead(start, end, Some(end + 1.0)).unwrap(), Boundary::Gap);
        assert_eq!(
            look_ahead(start, end, Some(DAY_START + 86_400.0)).unwrap(),
            Boundary::NewDay
        );
    }

    #[test]
    fn test_new_day_wins_over_gap() {
        let start = DAY_START + 82_800.0;
        let end = DAY_START + 86_000.0;
        let next = DAY_START + 86_400.0 + 7200.0;
        assert_eq!(look_ahead(start, end, Some(next)).unwrap(), Boundary::NewDay);
    }

    #[test]
    fn test_same_day_of_month_in_other_month_is_new_day() {
        // 2013-06-12 vs 2013-07-12
        let next = DAY_START + 30.0 * 86_400.0;
        assert_eq!(
            look_ahead(DAY_START, DAY_START + 60.0, Some(next)).unwrap(),
            Boundary::NewDay
        );
    }

    #[test]
    fn test_file_index_transitions() {
        assert_eq!(next_file_index(Boundary::Continue, 2), 2);
        assert_eq!(next_file_index(Boundary::Gap, 2), 3);
        assert_eq!(next_file_index(Boundary::NewDay, 2), 0);
        assert_eq!(next_file_index(Boundary::EndOfStack, 2), 2);
        assert!(Boundary::Gap.is_incomplete());
        assert!(!Boundary::Continue.is_incomplete());
    }
}
