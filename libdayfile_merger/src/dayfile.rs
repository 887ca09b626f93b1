use ndarray::Array2;
use time::Date;

/// A completed day-file, ready to be written.
///
/// Columns of `array` are (epoch seconds, value). Records are written once and never
/// modified.
#[derive(Debug, Clone)]
pub struct DayFileRecord {
    pub station: String,
    pub component: String,
    pub sampling_rate: f64,
    pub date: Date,
    pub file_index: u32,
    pub header: String,
    pub array: Array2<f64>,
}

impl DayFileRecord {
    pub fn new(
        station: &str,
        component: &str,
        sampling_interval: f64,
        date: Date,
        file_index: u32,
        array: Array2<f64>,
    ) -> Self {
        let sampling_rate = 1.0 / sampling_interval;
        Self {
            station: station.to_string(),
            component: component.to_lowercase(),
            sampling_rate,
            date,
            file_index,
            header: format!(
                "# {} {} {:.1} Hz",
                station,
                component.to_uppercase(),
                sampling_rate
            ),
            array,
        }
    }

    /// `<station>_<rate>Hz_<YYYYMMDD>_<index>.<component>`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:.1}Hz_{}_{}.{}",
            self.station,
            self.sampling_rate,
            date_string(&self.date),
            self.file_index,
            self.component
        )
    }

    pub fn n_rows(&self) -> usize {
        self.array.nrows()
    }

    pub fn first_time(&self) -> Option<f64> {
        self.array.get([0, 0]).copied()
    }

    pub fn last_time(&self) -> Option<f64> {
        let n_rows = self.array.nrows();
        if n_rows == 0 {
            return None;
        }
        self.array.get([n_rows - 1, 0]).copied()
    }
}

/// Calendar date in the YYYYMMDD form used in day-file names
pub fn date_string(date: &Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
