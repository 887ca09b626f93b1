/// Tolerance used when comparing timestamps (seconds)
pub const EPSILON: f64 = 1e-9;

/// Station name used when a filename carries no station prefix
pub const DUMMY_STATION: &str = "DUMMYSTATION";

/// Channel suffixes written by the EDL loggers
pub const COMPONENTS: [&str; 6] = ["ex", "ey", "bx", "by", "bz", "tp"];

/// Number of digits in the YYMMDDHHMMSS timestamp of a raw filename
pub const TIMESTAMP_DIGITS: usize = 12;

/// Two digit years below this are in the 2000s, the rest in the 1900s
pub const CENTURY_PIVOT: i32 = 50;

/// Subdirectory of the source directory receiving day-files by default
pub const DAYFILE_DIR_NAME: &str = "dayfiles";

/// Default total recording length of one raw file, used by the interval estimator (seconds)
pub const DEFAULT_FILE_DURATION: f64 = 3600.0;

/// INI section holding shared defaults rather than a station
pub const DEFAULT_SECTION: &str = "DEFAULT";
