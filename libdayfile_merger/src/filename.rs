use std::path::Path;
use time::{Date, Month, PrimitiveDateTime, Time};

use super::constants::{CENTURY_PIVOT, DUMMY_STATION, TIMESTAMP_DIGITS};
use super::error::FilenameError;

/// Station identity and start time decoded from a raw EDL filename.
///
/// Raw files are named `<prefix>.<stationname><YYMMDDHHMMSS>.<suffix>`; the second to
/// last dot-delimited token carries the station name followed by the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStamp {
    pub station: String,
    pub start_time: f64,
}

impl FileStamp {
    /// Parse the station name and start time (UTC epoch seconds) from a filename
    pub fn parse(path: &Path) -> Result<Self, FilenameError> {
        let name = file_name(path);
        let token = station_time_token(&name)?;

        if token.len() < TIMESTAMP_DIGITS || !token.is_char_boundary(token.len() - TIMESTAMP_DIGITS)
        {
            return Err(FilenameError::MalformedFilename(name.clone(), token.to_string()));
        }
        let (station_part, digits) = token.split_at(token.len() - TIMESTAMP_DIGITS);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FilenameError::MalformedFilename(name.clone(), token.to_string()));
        }

        let start_time =
            decode_timestamp(digits).map_err(|e| FilenameError::InvalidDateTime(name.clone(), e))?;

        let station = if station_part.is_empty() {
            String::from(DUMMY_STATION)
        } else {
            station_part.to_uppercase()
        };

        Ok(Self {
            station,
            start_time,
        })
    }
}

/// Start time of a raw file in UTC epoch seconds
pub fn start_time_from_filename(path: &Path) -> Result<f64, FilenameError> {
    Ok(FileStamp::parse(path)?.start_time)
}

/// Station name of a raw file, uppercased; DUMMYSTATION if the filename has none
pub fn station_from_filename(path: &Path) -> Result<String, FilenameError> {
    Ok(FileStamp::parse(path)?.station)
}

/// Format an epoch time back into the 12 digit YYMMDDHHMMSS form used by the loggers
pub fn format_timestamp(epoch_seconds: f64) -> Result<String, time::error::ComponentRange> {
    let datetime = time::OffsetDateTime::from_unix_timestamp(epoch_seconds.floor() as i64)?;
    Ok(format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}",
        datetime.year().rem_euclid(100),
        u8::from(datetime.month()),
        datetime.day(),
        datetime.hour(),
        datetime.minute(),
        datetime.second()
    ))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn station_time_token(name: &str) -> Result<&str, FilenameError> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 {
        return Err(FilenameError::MissingToken(name.to_string()));
    }
    Ok(parts[parts.len() - 2])
}

/// Decode YYMMDDHHMMSS (already checked to be ASCII digits) into epoch seconds
fn decode_timestamp(digits: &str) -> Result<f64, time::error::ComponentRange> {
    let field = |idx: usize| -> u8 {
        let bytes = digits.as_bytes();
        (bytes[idx] - b'0') * 10 + (bytes[idx + 1] - b'0')
    };

    let mut year = field(0) as i32;
    if year < CENTURY_PIVOT {
        year += 2000;
    } else {
        year += 1900;
    }
    let month = Month::try_from(field(2))?;
    let date = Date::from_calendar_date(year, month, field(4))?;
    let time = Time::from_hms(field(6), field(8), field(10))?;

    Ok(PrimitiveDateTime::new(date, time)
        .assume_utc()
        .unix_timestamp() as f64)
}
