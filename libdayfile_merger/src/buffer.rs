use ndarray::Array2;

use super::segment::RawSegment;

/// The in-progress output of the DayFileAssembler.
///
/// Holds the continuous run of samples accumulated for one day-file. The time axis is kept
/// strictly increasing with uniform spacing, which is what allows overlap trimming to use a
/// binary search.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    pub station: String,
    pub component: String,
    pub start_time: f64,
    pub sampling_interval: f64,
    time_axis: Vec<f64>,
    data: Vec<f64>,
}

impl TimeSeriesBuffer {
    /// Seed a new buffer with a segment
    pub fn from_segment(station: &str, component: &str, segment: &RawSegment) -> Self {
        let mut buffer = Self {
            station: station.to_string(),
            component: component.to_string(),
            start_time: segment.start_time,
            sampling_interval: segment.sampling_interval,
            time_axis: Vec::with_capacity(segment.sample_count()),
            data: Vec::with_capacity(segment.sample_count()),
        };
        buffer.append(segment);
        buffer
    }

    /// Timestamp of the last buffered sample
    pub fn last_time(&self) -> Option<f64> {
        self.time_axis.last().copied()
    }

    /// One sampling interval past the last buffered sample
    pub fn end_time(&self) -> Option<f64> {
        self.last_time().map(|t| t + self.sampling_interval)
    }

    /// Append a segment after the current end of the buffer
    pub fn append(&mut self, segment: &RawSegment) {
        if self.time_axis.is_empty() {
            self.start_time = segment.start_time;
        }
        self.time_axis
            .extend((0..segment.sample_count()).map(|idx| segment.time_at(idx)));
        self.data.extend_from_slice(&segment.samples);
    }

    /// Index of the buffered sample closest in time to `time`; ties go to the earlier sample
    pub fn nearest_index(&self, time: f64) -> Option<usize> {
        if self.time_axis.is_empty() {
            return None;
        }
        let upper = self.time_axis.partition_point(|t| *t < time);
        if upper == 0 {
            return Some(0);
        }
        if upper == self.time_axis.len() {
            return Some(upper - 1);
        }
        let below = time - self.time_axis[upper - 1];
        let above = self.time_axis[upper] - time;
        if above < below {
            Some(upper)
        } else {
            Some(upper - 1)
        }
    }

    /// Drop the tail of the buffer starting at the sample nearest to `time`.
    ///
    /// Returns the number of samples removed.
    pub fn trim_from(&mut self, time: f64) -> usize {
        match self.nearest_index(time) {
            Some(idx) => {
                let removed = self.time_axis.len() - idx;
                self.time_axis.truncate(idx);
                self.data.truncate(idx);
                removed
            }
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.time_axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_axis.is_empty()
    }

    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Convert to the (time, data) two column matrix written to day-files
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.time_axis.len(), 2), |(row, col)| {
            if col == 0 {
                self.time_axis[row]
            } else {
                self.data[row]
            }
        })
    }
}
