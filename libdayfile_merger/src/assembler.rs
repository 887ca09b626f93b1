use time::Date;

use super::buffer::TimeSeriesBuffer;
use super::constants::EPSILON;
use super::continuity::{look_ahead, next_file_index, place_segment, utc_date, Placement};
use super::dayfile::DayFileRecord;
use super::error::AssemblerError;
use super::segment::RawSegment;

/// A day-file being accumulated, with the date and index it will be written under
#[derive(Debug, Clone)]
pub struct OpenDayFile {
    pub buffer: TimeSeriesBuffer,
    pub date: Date,
    pub file_index: u32,
}

#[derive(Debug, Clone, Default)]
pub enum AssemblerState {
    #[default]
    Closed,
    Open(OpenDayFile),
}

/// DayFileAssembler takes the RawSegments of one component and composes them into day-files.
///
/// Segments must be given in chronological file order together with the start time of the
/// file that follows them, since midnight and gaps are only detectable by looking ahead.
/// Each component gets its own assembler.
#[derive(Debug)]
pub struct DayFileAssembler {
    station: String,
    component: String,
    sampling_interval: f64,
    file_index: u32,
    last_segment_start: Option<f64>,
    state: AssemblerState,
}

impl DayFileAssembler {
    /// Create a new DayFileAssembler for one station component
    pub fn new(station: &str, component: &str, sampling_interval: f64) -> Self {
        Self {
            station: station.to_string(),
            component: component.to_lowercase(),
            sampling_interval,
            file_index: 0,
            last_segment_start: None,
            state: AssemblerState::Closed,
        }
    }

    /// Add a segment to the day-file being built.
    ///
    /// `next_start` is the start time of the following file, or None if this is the last one.
    /// Returns a `Result<Option<DayFileRecord>>`. If the Option is Some, the segment completed
    /// the buffer and the finished day-file is returned; the assembler is closed again.
    pub fn push_segment(
        &mut self,
        segment: &RawSegment,
        next_start: Option<f64>,
    ) -> Result<Option<DayFileRecord>, AssemblerError> {
        if let Some(previous) = self.last_segment_start {
            if segment.start_time < previous - EPSILON {
                return Err(AssemblerError::SegmentOutOfOrder(segment.start_time, previous));
            }
        }
        if (segment.sampling_interval - self.sampling_interval).abs() > EPSILON {
            return Err(AssemblerError::MismatchedSampling(
                segment.sampling_interval,
                self.sampling_interval,
            ));
        }
        self.last_segment_start = Some(segment.start_time);

        let placement = place_segment(self.buffer_last_time(), segment.start_time, segment.end_time());
        let reference_end = self.apply_placement(placement, segment)?;

        let boundary = look_ahead(segment.start_time, reference_end, next_start)
            .map_err(|e| AssemblerError::BadTimestamp(segment.start_time, e))?;
        log::debug!(
            "{} {}: {:?} then {:?}",
            segment.file_path.to_string_lossy(),
            self.component,
            placement,
            boundary
        );
        self.file_index = next_file_index(boundary, self.file_index);

        if boundary.is_incomplete() {
            Ok(self.flush())
        } else {
            Ok(None)
        }
    }

    /// Takes any remaining buffered data and flushes it to a day-file.
    ///
    /// Used once the component's files are exhausted. Returns None if nothing is buffered.
    pub fn finish(&mut self) -> Option<DayFileRecord> {
        self.flush()
    }

    pub fn state(&self) -> &AssemblerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, AssemblerState::Open(_))
    }

    /// Index the next day-file opened will receive
    pub fn file_index(&self) -> u32 {
        self.file_index
    }

    fn buffer_last_time(&self) -> Option<f64> {
        match &self.state {
            AssemblerState::Open(open) => open.buffer.last_time(),
            AssemblerState::Closed => None,
        }
    }

    /// Place the segment into the buffer and return the end time to compare the next file with
    fn apply_placement(
        &mut self,
        placement: Placement,
        segment: &RawSegment,
    ) -> Result<f64, AssemblerError> {
        if placement == Placement::Seed {
            return self.seed(segment);
        }
        match &mut self.state {
            AssemblerState::Open(open) => Ok(Self::extend_open(open, placement, segment)),
            // place_segment only yields Seed when no buffer is open
            AssemblerState::Closed => self.seed(segment),
        }
    }

    fn seed(&mut self, segment: &RawSegment) -> Result<f64, AssemblerError> {
        let date = utc_date(segment.start_time)
            .map_err(|e| AssemblerError::BadTimestamp(segment.start_time, e))?;
        let buffer = TimeSeriesBuffer::from_segment(&self.station, &self.component, segment);
        self.state = AssemblerState::Open(OpenDayFile {
            buffer,
            date,
            file_index: self.file_index,
        });
        Ok(segment.end_time())
    }

    fn extend_open(open: &mut OpenDayFile, placement: Placement, segment: &RawSegment) -> f64 {
        match placement {
            Placement::Skip => {
                log::warn!(
                    "Skipping {}; its data is already covered",
                    segment.file_path.to_string_lossy()
                );
                return open.buffer.end_time().unwrap_or_else(|| segment.end_time());
            }
            Placement::TrimAppend => {
                let removed = open.buffer.trim_from(segment.start_time);
                log::debug!(
                    "Dropped {} overlapping samples before {}",
                    removed,
                    segment.file_path.to_string_lossy()
                );
                open.buffer.append(segment);
            }
            Placement::Append | Placement::Seed => open.buffer.append(segment),
        }
        segment.end_time()
    }

    fn flush(&mut self) -> Option<DayFileRecord> {
        match std::mem::take(&mut self.state) {
            AssemblerState::Open(open) if !open.buffer.is_empty() => Some(DayFileRecord::new(
                &self.station,
                &self.component,
                self.sampling_interval,
                open.date,
                open.file_index,
                open.buffer.to_array(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    // 2013-06-12T00:00:00Z
    const DAY_START: f64 = 1_370_995_200.0;

    fn segment(start: f64, n_samples: usize) -> RawSegment {
        let samples = (0..n_samples).map(|i| start + i as f64).collect();
        RawSegment::new(Path::new("EDL.seg.ex"), start, 1.0, samples)
    }

    fn assemble(segments: &[RawSegment]) -> Vec<DayFileRecord> {
        let mut assembler = DayFileAssembler::new("PB01", "ex", 1.0);
        let mut records = Vec::new();
        for (idx, seg) in segments.iter().enumerate() {
            let next = segments.get(idx + 1).map(|s| s.start_time);
            if let Some(record) = assembler.push_segment(seg, next).unwrap() {
                records.push(record);
            }
        }
        records.extend(assembler.finish());
        records
    }

    fn assert_uniform(record: &DayFileRecord, spacing: f64) {
        let times = record.array.column(0);
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - spacing).abs() < EPSILON);
        }
    }

    #[test]
    fn test_contiguous_files_make_one_dayfile() {
        let start = DAY_START + 3600.0;
        let segments = vec![
            segment(start, 100),
            segment(start + 100.0, 50),
            segment(start + 150.0, 25),
        ];
        let records = assemble(&segments);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].n_rows(), 175);
        assert_eq!(records[0].file_index, 0);
        assert_uniform(&records[0], 1.0);
    }

    #[test]
    fn test_overlap_drops_first_file_tail() {
        let start = DAY_START + 3600.0;
        let first = segment(start, 100);
        // Second file restarts 10 s before the first one ended, with distinct values
        let mut second = segment(start + 90.0, 30);
        second.samples = vec![-1.0; 30];
        let records = assemble(&[first, second]);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.n_rows(), 120);
        assert_uniform(record, 1.0);
        assert_eq!(record.array[[89, 1]], start + 89.0);
        assert_eq!(record.array[[90, 1]], -1.0);
        assert_eq!(record.last_time(), Some(start + 119.0));
    }

    #[test]
    fn test_superseded_file_is_skipped() {
        let start = DAY_START + 3600.0;
        let records = assemble(&[
            segment(start, 100),
            segment(start + 10.0, 20),
            segment(start + 100.0, 10),
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].n_rows(), 110);
        assert_uniform(&records[0], 1.0);
    }

    #[test]
    fn test_skipped_last_file_still_flushes() {
        let start = DAY_START + 3600.0;
        let records = assemble(&[segment(start, 100), segment(start + 10.0, 20)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].n_rows(), 100);
    }

    #[test]
    fn test_gap_increments_file_index() {
        let start = DAY_START + 3600.0;
        let records = assemble(&[
            segment(start, 100),
            segment(start + 200.0, 100),
            segment(start + 300.0, 100),
            segment(start + 1000.0, 10),
        ]);
        let indices: Vec<u32> = records.iter().map(|r| r.file_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(records[1].n_rows(), 200);
        assert!(records.iter().all(|r| r.date == records[0].date));
    }

    #[test]
    fn test_new_day_resets_file_index() {
        let late = DAY_START + 86_000.0;
        let records = assemble(&[
            segment(DAY_START + 3600.0, 10),
            segment(late, 100),
            segment(DAY_START + 86_400.0, 100),
            segment(DAY_START + 86_500.0, 100),
        ]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].file_index, 0);
        assert_eq!(records[1].file_index, 1);
        assert_eq!(records[2].file_index, 0);
        assert_eq!(records[2].n_rows(), 200);
        assert_ne!(records[1].date, records[2].date);
    }

    #[test]
    fn test_out_of_order_and_sampling_checks() {
        let mut assembler = DayFileAssembler::new("PB01", "ex", 1.0);
        assembler
            .push_segment(&segment(DAY_START + 500.0, 10), Some(DAY_START + 510.0))
            .unwrap();
        assert!(assembler.is_open());
        assert!(matches!(
            assembler.push_segment(&segment(DAY_START, 10), None),
            Err(AssemblerError::SegmentOutOfOrder(_, _))
        ));

        let mut fast = segment(DAY_START + 510.0, 10);
        fast.sampling_interval = 0.5;
        assert!(matches!(
            assembler.push_segment(&fast, None),
            Err(AssemblerError::MismatchedSampling(_, _))
        ));
    }

    #[test]
    fn test_finish_on_closed_assembler() {
        let mut assembler = DayFileAssembler::new("PB01", "ex", 1.0);
        assert!(assembler.finish().is_none());
        assert!(matches!(assembler.state(), AssemblerState::Closed));
    }
}
