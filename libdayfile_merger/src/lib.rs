//! # dayfile_merger
//!
//! dayfile_merger reassembles the raw ASCII time series written by EDL field data loggers
//! into calendar day files. Loggers write one file per channel per recording chunk, named
//! `<prefix>.<stationname><YYMMDDHHMMSS>.<channel>`. The merger sorts each channel's files by
//! the start time in their names, stitches contiguous and overlapping files into one
//! continuous time axis, splits the result at UTC midnight and starts a new file whenever the
//! recording has a gap.
//!
//! ## Installation
//!
//! Currently the only method of install is from source. Use
//! `cargo install --path ./dayfile_merger_cli` from the top level repository. To use the CLI
//! see the `dayfile_merger_cli` documentation.
//!
//! ## Configuration
//!
//! A run is controlled by a YAML file, which the CLI can generate with the `new` subcommand:
//!
//! ```yml
//! source_path: /data/edl/pb01
//! output_path: null
//! sampling_interval: 0.1
//! station_name: null
//! station_config_path: null
//! components: [ex, ey, bx, by, bz, tp]
//! skip_malformed_names: false
//! n_threads: 1
//! ```
//!
//! - `source_path`: directory holding the raw logger files of one station
//! - `output_path`: directory day-files are written to; `null` means `<source_path>/dayfiles`
//! - `sampling_interval`: seconds between samples. If `null`, it is taken from the station
//! configuration
//! - `station_name`: overrides the station name found in the filenames
//! - `station_config_path`: optional INI station configuration (see
//! [`station_config`](crate::station_config))
//! - `components`: channel suffixes to merge. Every listed channel must have files
//! - `skip_malformed_names`: skip files whose names carry no valid timestamp instead of failing
//! - `n_threads`: number of workers the channels are divided amongst
//!
//! ## Output
//!
//! Day-files are named `<station>_<rate>Hz_<YYYYMMDD>_<index>.<channel>`, where the index
//! counts the continuous runs within one day, starting at 0 for each new day. Each file holds
//! a header line `# <station> <CHANNEL> <rate> Hz` followed by one `<epoch seconds> <value>`
//! row per sample.
//!
//! ## Known limitations
//!
//! Only file starts are inspected. Midnight inside a file, or an outage inside a file, is not
//! detected and the data are written as if continuous.
pub mod assembler;
pub mod buffer;
pub mod component_stack;
pub mod config;
pub mod constants;
pub mod continuity;
pub mod dayfile;
pub mod dayfile_writer;
pub mod error;
pub mod filename;
pub mod process;
pub mod segment;
pub mod station_config;
pub mod worker_status;
