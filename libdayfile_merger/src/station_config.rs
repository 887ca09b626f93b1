//! Station metadata read from INI-style station configuration files.
//!
//! Each `[station]` section must carry the position, sampling interval and station type,
//! plus the electric and/or magnetic field setup keys required by that type. Every missing
//! or invalid entry is collected; a configuration with any issue is rejected as a whole.
//!
//! ```ini
//! [pb01]
//! latitude = -30:12:36
//! longitude = 138.5
//! elevation = 120
//! sampling_interval = 0.1
//! station_type = B
//! B_logger_type = edl
//! B_logger_gain = 1
//! B_instrument_type = coil
//! B_instrument_amplification = 1
//! ```
use ::config::{File, FileFormat, Map, Value};
use fxhash::FxHashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::constants::DEFAULT_SECTION;
use super::error::StationConfigError;

const E_FIELD_KEYWORDS: [&str; 8] = [
    "e_logger_type",
    "e_logger_gain",
    "e_instrument_type",
    "e_instrument_amplification",
    "e_xaxis_azimuth",
    "e_xaxis_length",
    "e_yaxis_azimuth",
    "e_yaxis_length",
];

const B_FIELD_KEYWORDS: [&str; 4] = [
    "b_logger_type",
    "b_logger_gain",
    "b_instrument_type",
    "b_instrument_amplification",
];

/// What a station records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    /// Both electric and magnetic field
    MT,
    /// Electric field only
    E,
    /// Magnetic field only
    B,
}

impl StationKind {
    pub fn records_e_field(&self) -> bool {
        matches!(self, Self::MT | Self::E)
    }

    pub fn records_b_field(&self) -> bool {
        matches!(self, Self::MT | Self::B)
    }
}

impl FromStr for StationKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mt" => Ok(Self::MT),
            "e" => Ok(Self::E),
            "b" => Ok(Self::B),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EFieldSetup {
    pub logger_type: String,
    pub logger_gain: String,
    pub instrument_type: String,
    pub instrument_amplification: f64,
    pub x_axis_azimuth: f64,
    pub x_axis_length: f64,
    pub y_axis_azimuth: f64,
    pub y_axis_length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BFieldSetup {
    pub logger_type: String,
    pub logger_gain: String,
    pub instrument_type: String,
    pub instrument_amplification: f64,
}

/// Validated metadata of one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationMetadata {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub sampling_interval: f64,
    pub kind: StationKind,
    pub e_field: Option<EFieldSetup>,
    pub b_field: Option<BFieldSetup>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    MissingKeyword,
    InvalidValue(String),
    UnknownStationType(String),
}

/// One problem found while validating a station section
#[derive(Debug, Clone, PartialEq)]
pub struct StationIssue {
    pub station: String,
    pub keyword: String,
    pub kind: IssueKind,
}

impl StationIssue {
    pub fn is_missing_keyword(&self) -> bool {
        self.kind == IssueKind::MissingKeyword
    }
}

impl fmt::Display for StationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::MissingKeyword => {
                write!(f, "Station {} - keyword {} missing", self.station, self.keyword)
            }
            IssueKind::InvalidValue(value) => write!(
                f,
                "Station {} - keyword {} has invalid value {:?}",
                self.station, self.keyword, value
            ),
            IssueKind::UnknownStationType(value) => write!(
                f,
                "Station {} - unknown station_type {:?}; expected MT, E or B",
                self.station, value
            ),
        }
    }
}

/// All stations of a station configuration file, keyed by uppercased station name
#[derive(Debug, Clone, Default)]
pub struct StationConfig {
    stations: FxHashMap<String, StationMetadata>,
}

impl StationConfig {
    /// Read and validate a station configuration file
    pub fn read_config_file(path: &Path) -> Result<Self, StationConfigError> {
        if !path.exists() {
            return Err(StationConfigError::BadFilePath(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    /// Metadata for a station; names are matched case-insensitively
    pub fn get(&self, station: &str) -> Option<&StationMetadata> {
        self.stations.get(&station.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn station_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stations.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }
}

impl FromStr for StationConfig {
    type Err = StationConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sections = parse_sections(s)?;
        let mut issues: Vec<StationIssue> = Vec::new();
        let mut config = Self::default();
        for (station, entries) in sections {
            let mut reader = SectionReader {
                station: &station,
                entries: &entries,
                issues: &mut issues,
            };
            if let Some(metadata) = reader.read_station() {
                config.stations.insert(station.clone(), metadata);
            }
        }

        if issues.is_empty() {
            Ok(config)
        } else {
            Err(StationConfigError::Invalid(issues))
        }
    }
}

/// Load INI text into sections of lowercase-keyed entries; section names are uppercased.
///
/// The `[DEFAULT]` section holds no station and is left out. Values lose any inline comment
/// introduced by whitespace and `;`.
fn parse_sections(
    text: &str,
) -> Result<Vec<(String, FxHashMap<String, String>)>, StationConfigError> {
    let root: Map<String, Value> = ::config::Config::builder()
        .add_source(File::from_str(text, FileFormat::Ini))
        .build()?
        .try_deserialize()?;

    let mut sections: Vec<(String, FxHashMap<String, String>)> = Vec::new();
    for (name, value) in root {
        let table = match value.into_table() {
            Ok(t) => t,
            // An entry before any section header
            Err(_) => return Err(StationConfigError::EntryOutsideSection(name)),
        };
        let name = name.trim().to_uppercase();
        if name == DEFAULT_SECTION {
            continue;
        }

        let mut entries: FxHashMap<String, String> = FxHashMap::default();
        for (key, value) in table {
            let value = value.into_string()?;
            entries.insert(
                key.trim().to_lowercase(),
                strip_inline_comment(&value).to_string(),
            );
        }
        sections.push((name, entries));
    }
    sections.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sections)
}

/// Cut a value at the first `;` preceded by whitespace
fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b';' && idx > 0 && bytes[idx - 1].is_ascii_whitespace() {
            return value[..idx].trim();
        }
    }
    value.trim()
}

/// Parse decimal degrees or a `deg:min:sec` triplet
pub fn parse_coordinate(value: &str) -> Option<f64> {
    let value = value.trim();
    if !value.contains(':') {
        return value.parse().ok();
    }

    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let degrees: f64 = parts[0].trim().parse().ok()?;
    let minutes: f64 = match parts.get(1) {
        Some(m) => m.trim().parse().ok()?,
        None => 0.0,
    };
    let seconds: f64 = match parts.get(2) {
        Some(s) => s.trim().parse().ok()?,
        None => 0.0,
    };
    if !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if parts[0].trim().starts_with('-') {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

struct SectionReader<'a> {
    station: &'a str,
    entries: &'a FxHashMap<String, String>,
    issues: &'a mut Vec<StationIssue>,
}

impl<'a> SectionReader<'a> {
    fn read_station(&mut self) -> Option<StationMetadata> {
        let latitude = self.coordinate("latitude", -90.0..=90.0);
        let longitude = self.coordinate("longitude", -180.0..=180.0);
        let elevation = self.coordinate("elevation", f64::MIN..=f64::MAX);
        let sampling_interval = self.number("sampling_interval").and_then(|dt| {
            if dt > 0.0 {
                Some(dt)
            } else {
                self.invalid("sampling_interval");
                None
            }
        });
        let kind = self.string("station_type").and_then(|s| match s.parse::<StationKind>() {
            Ok(kind) => Some(kind),
            Err(value) => {
                self.push("station_type", IssueKind::UnknownStationType(value));
                None
            }
        });

        // Field setup keys can only be checked once the station type is known
        let (e_field, b_field) = match kind {
            Some(k) => (
                if k.records_e_field() { self.e_field() } else { None },
                if k.records_b_field() { self.b_field() } else { None },
            ),
            None => (None, None),
        };

        let kind = kind?;
        if (kind.records_e_field() && e_field.is_none())
            || (kind.records_b_field() && b_field.is_none())
        {
            return None;
        }

        Some(StationMetadata {
            name: self.station.to_string(),
            latitude: latitude?,
            longitude: longitude?,
            elevation: elevation?,
            sampling_interval: sampling_interval?,
            kind,
            e_field,
            b_field,
        })
    }

    fn e_field(&mut self) -> Option<EFieldSetup> {
        let [logger_type, logger_gain, instrument_type, amplification, x_azimuth, x_length, y_azimuth, y_length] =
            E_FIELD_KEYWORDS;
        let logger_type = self.string(logger_type);
        let logger_gain = self.string(logger_gain);
        let instrument_type = self.string(instrument_type);
        let amplification = self.number(amplification);
        let x_azimuth = self.number(x_azimuth);
        let x_length = self.number(x_length);
        let y_azimuth = self.number(y_azimuth);
        let y_length = self.number(y_length);
        Some(EFieldSetup {
            logger_type: logger_type?,
            logger_gain: logger_gain?,
            instrument_type: instrument_type?,
            instrument_amplification: amplification?,
            x_axis_azimuth: x_azimuth?,
            x_axis_length: x_length?,
            y_axis_azimuth: y_azimuth?,
            y_axis_length: y_length?,
        })
    }

    fn b_field(&mut self) -> Option<BFieldSetup> {
        let [logger_type, logger_gain, instrument_type, amplification] = B_FIELD_KEYWORDS;
        let logger_type = self.string(logger_type);
        let logger_gain = self.string(logger_gain);
        let instrument_type = self.string(instrument_type);
        let amplification = self.number(amplification);
        Some(BFieldSetup {
            logger_type: logger_type?,
            logger_gain: logger_gain?,
            instrument_type: instrument_type?,
            instrument_amplification: amplification?,
        })
    }

    /// Look up a key, accepting the three letter short form for positions
    fn lookup(&self, keyword: &str) -> Option<&'a String> {
        let entries = self.entries;
        entries.get(keyword).or_else(|| {
            if matches!(keyword, "latitude" | "longitude" | "elevation") {
                entries.get(&keyword[..3])
            } else {
                None
            }
        })
    }

    fn string(&mut self, keyword: &str) -> Option<String> {
        match self.lookup(keyword) {
            Some(value) if !value.is_empty() => Some(value.to_lowercase()),
            _ => {
                self.push(keyword, IssueKind::MissingKeyword);
                None
            }
        }
    }

    fn number(&mut self, keyword: &str) -> Option<f64> {
        let value = self.string(keyword)?;
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.push(keyword, IssueKind::InvalidValue(value));
                None
            }
        }
    }

    fn coordinate(&mut self, keyword: &str, range: std::ops::RangeInclusive<f64>) -> Option<f64> {
        let value = self.string(keyword)?;
        match parse_coordinate(&value) {
            Some(v) if range.contains(&v) => Some(v),
            _ => {
                self.push(keyword, IssueKind::InvalidValue(value));
                None
            }
        }
    }

    fn invalid(&mut self, keyword: &str) {
        let value = self.lookup(keyword).cloned().unwrap_or_default();
        self.push(keyword, IssueKind::InvalidValue(value));
    }

    fn push(&mut self, keyword: &str, kind: IssueKind) {
        self.issues.push(StationIssue {
            station: self.station.to_string(),
            keyword: keyword.to_string(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "
# survey stations
[pb01]
lat = -30:30:00
lon = 138.25
ele = 120
sampling_interval = 0.1
station_type = B
B_logger_type = edl
B_logger_gain = 1
B_instrument_type = coil
B_instrument_amplification = 10

[pb02]
latitude: -30.6
longitude: 138.3
elevation: 95.5
sampling_interval: 0.5
station_type: mt
E_logger_type = edl
E_logger_gain = low
E_instrument_type = electrodes
E_instrument_amplification = 1
E_Xaxis_azimuth = 0
E_Xaxis_length = 50
E_Yaxis_azimuth = 90
E_Yaxis_length = 50
B_logger_type = edl
B_logger_gain = 1
B_instrument_type = fluxgate
B_instrument_amplification = 1
";

    #[test]
    fn test_valid_config() {
        let config: StationConfig = VALID.parse().unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.station_names(), vec!["PB01", "PB02"]);

        let pb01 = config.get("pb01").unwrap();
        assert_eq!(pb01.kind, StationKind::B);
        assert_eq!(pb01.latitude, -30.5);
        assert_eq!(pb01.sampling_interval, 0.1);
        assert!(pb01.e_field.is_none());
        assert_eq!(pb01.b_field.as_ref().unwrap().instrument_type, "coil");

        let pb02 = config.get("PB02").unwrap();
        assert_eq!(pb02.kind, StationKind::MT);
        assert_eq!(pb02.e_field.as_ref().unwrap().y_axis_azimuth, 90.0);
        assert_eq!(pb02.b_field.as_ref().unwrap().instrument_type, "fluxgate");
    }

    #[test]
    fn test_missing_sampling_interval_rejects_all() {
        let text = VALID.replace("sampling_interval: 0.5\n", "");
        let err = text.parse::<StationConfig>().unwrap_err();
        let issues = err.issues();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_missing_keyword());
        assert_eq!(issues[0].station, "PB02");
        assert_eq!(issues[0].keyword, "sampling_interval");
        assert_eq!(
            issues[0].to_string(),
            "Station PB02 - keyword sampling_interval missing"
        );
    }

    #[test]
    fn test_issues_are_collected() {
        let text = "
[ab]
latitude = 95
longitude = 10
station_type = E
[cd]
latitude = 1
longitude = 2
elevation = 3
sampling_interval = -1
station_type = X
";
        let err = text.parse::<StationConfig>().unwrap_err();
        let issues = err.issues();
        let missing = issues.iter().filter(|i| i.is_missing_keyword()).count();
        // ab: elevation, sampling_interval and all eight E keywords
        assert_eq!(missing, 10);
        assert!(issues.contains(&StationIssue {
            station: String::from("AB"),
            keyword: String::from("latitude"),
            kind: IssueKind::InvalidValue(String::from("95")),
        }));
        assert!(issues.contains(&StationIssue {
            station: String::from("CD"),
            keyword: String::from("sampling_interval"),
            kind: IssueKind::InvalidValue(String::from("-1")),
        }));
        assert!(issues
            .iter()
            .any(|i| matches!(i.kind, IssueKind::UnknownStationType(_))));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            "latitude = 1\n[ab]\n".parse::<StationConfig>(),
            Err(StationConfigError::EntryOutsideSection(_))
        ));
        assert!(matches!(
            "[ab]\njust some words\n".parse::<StationConfig>(),
            Err(StationConfigError::ParsingError(_))
        ));
    }

    #[test]
    fn test_inline_comments_are_dropped() {
        let text = VALID.replace(
            "sampling_interval = 0.1\n",
            "sampling_interval = 0.1 ; seconds\n",
        );
        let config: StationConfig = text.parse().unwrap();
        assert_eq!(config.get("PB01").unwrap().sampling_interval, 0.1);

        assert_eq!(strip_inline_comment("edl ; logger"), "edl");
        assert_eq!(strip_inline_comment("a;b"), "a;b");
    }

    #[test]
    fn test_default_section_is_not_a_station() {
        let text = format!("[DEFAULT]\nelevation = 100\n{VALID}");
        let config: StationConfig = text.parse().unwrap();
        assert_eq!(config.station_names(), vec!["PB01", "PB02"]);
        assert!(config.get("DEFAULT").is_none());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("12.5"), Some(12.5));
        assert_eq!(parse_coordinate("12:30"), Some(12.5));
        assert_eq!(parse_coordinate("-12:30:36"), Some(-12.51));
        assert_eq!(parse_coordinate("12:75:00"), None);
        assert_eq!(parse_coordinate("north"), None);
    }
}
