use clap::{Arg, ArgAction, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use simplelog::{CombinedLogger, SharedLogger, TermLogger, WriteLogger};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use libdayfile_merger::config::Config;
use libdayfile_merger::constants::DEFAULT_FILE_DURATION;
use libdayfile_merger::error::{ProcessorError, StationConfigError};
use libdayfile_merger::process::{create_subsets, process_subset};
use libdayfile_merger::segment::estimate_sampling_interval;
use libdayfile_merger::station_config::StationConfig;
use libdayfile_merger::worker_status::{BarColor, WorkerStatus};

const LOG_FILE_NAME: &str = "dayfile_merger.log";

fn make_template_config(path: &Path) -> Result<(), String> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).map_err(|e| e.to_string())?;
    let mut file = File::create(path).map_err(|e| e.to_string())?;
    file.write_all(yaml_str.as_bytes())
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn init_logging(pb_manager: &MultiProgress, verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];
    // Terminal only if the log file can't be created
    if let Ok(file) = File::create(LOG_FILE_NAME) {
        loggers.push(WriteLogger::new(level, simplelog::Config::default(), file));
    }

    LogWrapper::new(pb_manager.clone(), CombinedLogger::new(loggers)).try_init()
}

fn bar_style(color: &BarColor) -> ProgressStyle {
    let template = match color {
        BarColor::CYAN => "{prefix:>12} [{bar:40.cyan/blue}] {percent:>3}%",
        BarColor::GREEN => "{prefix:>12} [{bar:40.green/blue}] {percent:>3}%",
        BarColor::RED => "{prefix:>12} [{bar:40.red/blue}] {percent:>3}%",
    };
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Validate a station configuration and report every issue found
fn check_station_config(path: &Path) -> i32 {
    log::info!("Checking station configuration {}...", path.to_string_lossy());
    match StationConfig::read_config_file(path) {
        Ok(stations) => {
            log::info!("Station configuration is valid.");
            for name in stations.station_names() {
                log::info!("Station: {name}");
            }
            log::info!("Found {} station(s).", stations.len());
            0
        }
        Err(e @ StationConfigError::Invalid(_)) => {
            for issue in e.issues() {
                log::error!("{issue}");
            }
            log::error!(
                "Station configuration rejected with {} error(s), {} missing keyword(s)",
                e.issues().len(),
                e.missing_keyword_count()
            );
            1
        }
        Err(e) => {
            log::error!("{e}");
            1
        }
    }
}

fn estimate(matches: &ArgMatches) -> i32 {
    let file = match matches.get_one::<String>("file") {
        Some(f) => PathBuf::from(f),
        None => {
            log::error!("estimate requires a --file");
            return 1;
        }
    };
    let duration = matches
        .get_one::<f64>("duration")
        .copied()
        .unwrap_or(DEFAULT_FILE_DURATION);

    match estimate_sampling_interval(&file, duration) {
        Ok(dt) => {
            log::info!(
                "Estimated sampling interval of {}: {} s ({:.1} Hz) for a {} s file",
                file.to_string_lossy(),
                dt,
                1.0 / dt,
                duration
            );
            0
        }
        Err(e) => {
            let err = ProcessorError::from(e);
            log::error!("{err}");
            err.exit_code()
        }
    }
}

/// Run the merge described by the configuration at `config_path`
fn merge(config_path: &Path, pb_manager: &MultiProgress) -> i32 {
    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return 1;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Source Path: {}", config.source_path.to_string_lossy());
    log::info!(
        "Output Path: {}",
        config.get_output_directory().to_string_lossy()
    );
    match config.sampling_interval {
        Some(dt) => log::info!("Sampling Interval: {dt} s"),
        None => log::info!("Sampling Interval: from station configuration"),
    }
    if let Some(name) = &config.station_name {
        log::info!("Station Name: {name}");
    }
    if let Some(path) = &config.station_config_path {
        log::info!("Station Config Path: {}", path.to_string_lossy());
    }
    log::info!("Components: {}", config.components.join(", "));
    log::info!("Number of Workers: {}", config.n_threads);

    if !config.is_n_threads_valid() {
        log::error!("n_threads must be at least 1, found {}", config.n_threads);
        return 1;
    }
    if let Err(e) = config.validate() {
        log::error!("{e}");
        return 1;
    }

    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let mut bars: HashMap<usize, ProgressBar> = HashMap::new();
    let mut workers = Vec::new();
    for (idx, subset) in create_subsets(&config).into_iter().enumerate() {
        // Dont make empty workers
        if subset.is_empty() {
            continue;
        }
        let bar = pb_manager.add(ProgressBar::new(100));
        bar.set_style(bar_style(&BarColor::CYAN));
        bar.set_prefix(format!("Worker {idx}"));
        bars.insert(idx, bar);

        let conf = config.clone();
        let worker_tx = tx.clone();
        workers.push(std::thread::spawn(move || {
            process_subset(conf, worker_tx, idx, subset)
        }));
    }
    // Only the workers hold senders now, so the receiver closes once they are all done
    drop(tx);

    for status in rx.iter() {
        if let Some(bar) = bars.get(&status.worker_id) {
            bar.set_style(bar_style(&status.color));
            bar.set_prefix(format!("{} {}", status.worker_id, status.component));
            bar.set_position((status.progress * 100.0) as u64);
        }
    }

    let mut exit_code = 0;
    for worker in workers {
        match worker.join() {
            Ok(Ok(paths)) => log::info!("Worker complete, wrote {} day-file(s)", paths.len()),
            Ok(Err(e)) => {
                log::error!("Merging failed with error: {e}");
                if exit_code == 0 {
                    exit_code = e.exit_code();
                }
            }
            Err(_) => {
                log::error!("Failed to join merging task!");
                if exit_code == 0 {
                    exit_code = 4;
                }
            }
        }
    }
    for bar in bars.values() {
        bar.finish();
    }

    if exit_code == 0 {
        log::info!("Successfully merged data!");
    }
    exit_code
}

fn main() {
    // Create a cli
    let matches = Command::new("dayfile_merger_cli")
        .about("Merge EDL logger files into continuous day-files")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("check").about("Validate the station configuration file given by --path"),
        )
        .subcommand(
            Command::new("estimate")
                .about("Estimate the sampling interval of a raw file")
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .required(true)
                        .help("Raw logger file"),
                )
                .arg(
                    Arg::new("duration")
                        .short('d')
                        .long("duration")
                        .value_parser(clap::value_parser!(f64))
                        .help("Recording duration of the file in seconds"),
                ),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log resolver decisions"),
        )
        .get_matches();

    // Initialize feedback
    let pb_manager = MultiProgress::new();
    if let Err(e) = init_logging(&pb_manager, matches.get_flag("verbose")) {
        eprintln!("Could not create logging/progress: {e}");
        std::process::exit(1);
    }

    if let Some(("estimate", sub_matches)) = matches.subcommand() {
        std::process::exit(estimate(sub_matches));
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A path is required, use --path");
            std::process::exit(1);
        }
    };

    let exit_code = match matches.subcommand() {
        Some(("new", _)) => {
            log::info!(
                "Making a template config at {}...",
                config_path.to_string_lossy()
            );
            match make_template_config(&config_path) {
                Ok(()) => 0,
                Err(e) => {
                    log::error!("Could not write template config: {e}");
                    4
                }
            }
        }
        Some(("check", _)) => check_station_config(&config_path),
        _ => merge(&config_path, &pb_manager),
    };

    if exit_code == 0 {
        log::info!("Done.");
    }
    std::process::exit(exit_code);
}
