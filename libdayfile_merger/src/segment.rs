use ndarray::{Array2, Axis};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::error::SegmentError;
use super::filename::start_time_from_filename;

/// The samples of one raw logger file placed on a time axis.
///
/// The start time comes from the filename; the sampling interval is supplied by the caller.
/// A segment is never modified after it is read.
#[derive(Debug, Clone)]
pub struct RawSegment {
    pub file_path: PathBuf,
    pub start_time: f64,
    pub sampling_interval: f64,
    pub samples: Vec<f64>,
}

impl RawSegment {
    /// Read a raw file, taking the start time from its name
    pub fn read(path: &Path, sampling_interval: f64) -> Result<Self, SegmentError> {
        let start_time = start_time_from_filename(path)?;
        Self::read_with_start(path, start_time, sampling_interval)
    }

    /// Read a raw file whose start time is already known
    pub fn read_with_start(
        path: &Path,
        start_time: f64,
        sampling_interval: f64,
    ) -> Result<Self, SegmentError> {
        let table = read_numeric_table(path)?;
        // Two dimensional data carries a time channel in column 0
        let column = if table.ncols() == 1 { 0 } else { 1 };
        let samples = table.index_axis(Axis(1), column).to_vec();
        Ok(Self::new(path, start_time, sampling_interval, samples))
    }

    pub fn new(path: &Path, start_time: f64, sampling_interval: f64, samples: Vec<f64>) -> Self {
        Self {
            file_path: path.to_path_buf(),
            start_time,
            sampling_interval,
            samples,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// One sampling interval past the last sample
    pub fn end_time(&self) -> f64 {
        self.start_time + self.samples.len() as f64 * self.sampling_interval
    }

    /// Timestamp of the sample at `idx`
    pub fn time_at(&self, idx: usize) -> f64 {
        self.start_time + idx as f64 * self.sampling_interval
    }

    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.samples.len()).map(|idx| self.time_at(idx)).collect()
    }
}

/// Estimate the sampling interval of a raw file recorded for `total_duration` seconds
pub fn estimate_sampling_interval(path: &Path, total_duration: f64) -> Result<f64, SegmentError> {
    let table = read_numeric_table(path)?;
    Ok(total_duration / table.nrows() as f64)
}

/// Load whitespace separated numeric content into a rows x columns array.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn read_numeric_table(path: &Path) -> Result<Array2<f64>, SegmentError> {
    if !path.exists() {
        return Err(SegmentError::BadFilePath(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| SegmentError::UnreadableFile(path.to_path_buf(), e))?;
    let reader = BufReader::new(file);

    let mut values: Vec<f64> = Vec::new();
    let mut n_cols: Option<usize> = None;
    let mut n_rows: usize = 0;
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SegmentError::UnreadableFile(path.to_path_buf(), e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut row_len = 0;
        for entry in trimmed.split_whitespace() {
            let value: f64 = entry.parse().map_err(|_| {
                SegmentError::NonNumeric(path.to_path_buf(), line_idx + 1, entry.to_string())
            })?;
            values.push(value);
            row_len += 1;
        }

        match n_cols {
            None => n_cols = Some(row_len),
            Some(expected) if expected != row_len => {
                return Err(SegmentError::RaggedRows(
                    path.to_path_buf(),
                    line_idx + 1,
                    row_len,
                    expected,
                ))
            }
            Some(_) => (),
        }
        n_rows += 1;
    }

    let n_cols = match n_cols {
        Some(n) => n,
        None => return Err(SegmentError::Empty(path.to_path_buf())),
    };

    Array2::from_shape_vec((n_rows, n_cols), values)
        .map_err(|e| SegmentError::ShapeError(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_single_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EDL.pb01130612080000.ex");
        fs::write(&path, "1.5\n-2.0\n\n3.25\n").unwrap();

        let segment = RawSegment::read(&path, 0.5).unwrap();
        assert_eq!(segment.samples, vec![1.5, -2.0, 3.25]);
        assert_eq!(segment.sample_count(), 3);
        assert_eq!(segment.start_time, 1_371_024_000.0);
        assert_eq!(segment.end_time(), 1_371_024_001.5);
        assert_eq!(segment.time_axis()[2], 1_371_024_001.0);
    }

    #[test]
    fn test_time_column_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EDL.pb01130612080000.bx");
        fs::write(&path, "# logger dump\n0 10.0\n1 11.0\n2 12.0\n").unwrap();

        let segment = RawSegment::read(&path, 1.0).unwrap();
        assert_eq!(segment.samples, vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_unreadable_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EDL.pb01130612080000.by");
        fs::write(&path, "1.0\nabc\n").unwrap();
        assert!(matches!(
            RawSegment::read(&path, 1.0),
            Err(SegmentError::NonNumeric(_, 2, _))
        ));

        fs::write(&path, "1.0 2.0\n3.0\n").unwrap();
        assert!(matches!(
            RawSegment::read(&path, 1.0),
            Err(SegmentError::RaggedRows(_, 2, 1, 2))
        ));

        fs::write(&path, "# only a comment\n").unwrap();
        assert!(matches!(
            RawSegment::read(&path, 1.0),
            Err(SegmentError::Empty(_))
        ));

        let missing = dir.path().join("EDL.pb01130612090000.by");
        assert!(matches!(
            RawSegment::read(&missing, 1.0),
            Err(SegmentError::BadFilePath(_))
        ));
    }

    #[test]
    fn test_estimate_sampling_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EDL.pb01130612080000.bz");
        let content: String = (0..400).map(|i| format!("{i}\n")).collect();
        fs::write(&path, content).unwrap();

        let interval = estimate_sampling_interval(&path, 100.0).unwrap();
        assert_eq!(interval, 0.25);
    }
}
