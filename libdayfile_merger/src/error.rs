use std::path::PathBuf;
use thiserror::Error;

use super::station_config::StationIssue;
use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, Error)]
pub enum FilenameError {
    #[error("Filename {0} has no station/timestamp token before its suffix")]
    MissingToken(String),
    #[error("Filename {0} is malformed; token {1} does not end in 12 digits YYMMDDHHMMSS")]
    MalformedFilename(String, String),
    #[error("Filename {0} encodes an invalid date/time: {1}")]
    InvalidDateTime(String, time::error::ComponentRange),
}

#[derive(Debug, Error)]
pub enum ComponentStackError {
    #[error("ComponentStack failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ComponentStack could not open directory {0:?} because it does not exist")]
    DirectoryNotFound(PathBuf),
    #[error("ComponentStack did not find any files to combine in directory {0:?}")]
    NoMatchingFiles(PathBuf),
    #[error("ComponentStack did not find any {0} files in directory {1:?}")]
    NoComponentFiles(String, PathBuf),
    #[error("ComponentStack failed due to filename error: {0}")]
    BadFilename(#[from] FilenameError),
}

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("Could not open segment file {0:?} because it does not exist")]
    BadFilePath(PathBuf),
    #[error("Segment file {0:?} is unreadable due to IO error: {1}")]
    UnreadableFile(PathBuf, std::io::Error),
    #[error("Segment file {0:?} has non-numeric content at line {1}: {2:?}")]
    NonNumeric(PathBuf, usize, String),
    #[error("Segment file {0:?} has ragged rows; line {1} has {2} columns, expected {3}")]
    RaggedRows(PathBuf, usize, usize, usize),
    #[error("Segment file {0:?} does not contain any samples")]
    Empty(PathBuf),
    #[error("Segment file {0:?} could not be shaped into an array: {1}")]
    ShapeError(PathBuf, ndarray::ShapeError),
    #[error("Segment failed due to filename error: {0}")]
    BadFilename(#[from] FilenameError),
}

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("DayFileAssembler received a segment out of order -- segment start: {0} previous start: {1}")]
    SegmentOutOfOrder(f64, f64),
    #[error("DayFileAssembler received a segment with sampling interval {0} while assembling at {1}")]
    MismatchedSampling(f64, f64),
    #[error("DayFileAssembler could not convert timestamp {0} into a calendar date: {1}")]
    BadTimestamp(f64, time::error::ComponentRange),
}

#[derive(Debug, Error)]
pub enum DayFileWriterError {
    #[error("DayFileWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("DayFileWriter could not use output path {0:?} because it is not a directory")]
    BadOutputPath(PathBuf),
}

#[derive(Debug, Error)]
pub enum StationConfigError {
    #[error("Failed to load station configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Station configuration failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Station configuration is not a proper configuration file: {0}")]
    ParsingError(#[from] ::config::ConfigError),
    #[error("Station configuration entry {0:?} is not inside a [station] section")]
    EntryOutsideSection(String),
    #[error("Station configuration rejected; found {count} error(s)", count = .0.len())]
    Invalid(Vec<StationIssue>),
}

impl StationConfigError {
    /// The collected validation issues, empty unless the configuration was rejected
    pub fn issues(&self) -> &[StationIssue] {
        match self {
            Self::Invalid(issues) => issues,
            _ => &[],
        }
    }

    pub fn missing_keyword_count(&self) -> usize {
        self.issues().iter().filter(|i| i.is_missing_keyword()).count()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has invalid sampling interval {0}; must be a positive number of seconds")]
    InvalidSamplingInterval(f64),
    #[error("Config has no sampling interval for station {0}; set sampling_interval or provide a station configuration")]
    MissingSamplingInterval(String),
    #[error("Config station configuration has no entry for station {0}")]
    UnknownStation(String),
    #[error("Config requests unknown component {0}")]
    UnknownComponent(String),
    #[error("Config does not request any components")]
    NoComponents,
    #[error("Config failed due to station configuration error: {0}")]
    StationConfig(#[from] StationConfigError),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to ComponentStack error: {0}")]
    StackError(#[from] ComponentStackError),
    #[error("Processor failed due to Segment error: {0}")]
    SegmentError(#[from] SegmentError),
    #[error("Processor failed due to DayFileAssembler error: {0}")]
    AssemblerError(#[from] AssemblerError),
    #[error("Processor failed due to DayFileWriter error: {0}")]
    WriterError(#[from] DayFileWriterError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProcessorError {
    /// Process exit code for this failure
    ///
    /// 1 bad input path or configuration, 2 no matching files, 3 unreadable segment
    /// or malformed file name, 4 failure writing output
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StackError(ComponentStackError::NoMatchingFiles(_))
            | Self::StackError(ComponentStackError::NoComponentFiles(_, _)) => 2,
            Self::StackError(ComponentStackError::BadFilename(_)) => 3,
            Self::StackError(_) | Self::ConfigError(_) => 1,
            Self::SegmentError(_) | Self::AssemblerError(_) => 3,
            Self::WriterError(_) | Self::SendError(_) | Self::IoError(_) => 4,
        }
    }
}
