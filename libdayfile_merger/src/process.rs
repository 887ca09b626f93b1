use std::path::PathBuf;
use std::sync::mpsc::Sender;

use super::assembler::DayFileAssembler;
use super::component_stack::ComponentStack;
use super::config::Config;
use super::dayfile_writer::DayFileWriter;
use super::error::ProcessorError;
use super::segment::RawSegment;
use super::station_config::StationConfig;
use super::worker_status::{BarColor, WorkerStatus};

/// The main loop of dayfile_merger for one component.
///
/// Reads the component's raw files in chronological order, assembles them into day-files and
/// writes each one as soon as it is complete. Returns the paths of the day-files written.
pub fn process_component(
    config: &Config,
    station_config: Option<&StationConfig>,
    component: &str,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<Vec<PathBuf>, ProcessorError> {
    let mut stack = ComponentStack::new(
        &config.source_path,
        component,
        config.skip_malformed_names,
    )?;
    log::info!(
        "Found {} {} files in {} with total size: {}",
        stack.len(),
        stack.component,
        stack.parent_path().to_string_lossy(),
        human_bytes::human_bytes(stack.total_stack_size_bytes as f64)
    );

    // The stack is never empty once built
    let file_station = stack.first_station().unwrap_or_default().to_string();
    let station = config.get_station_name(&file_station);
    let sampling_interval = config.resolve_sampling_interval(&station, station_config)?;
    log::info!(
        "Assembling station {} component {} at {} s sampling interval",
        station,
        stack.component,
        sampling_interval
    );

    let mut assembler = DayFileAssembler::new(&station, component, sampling_interval);
    let mut writer = DayFileWriter::new(&config.get_output_directory())?;
    let mut written: Vec<PathBuf> = Vec::new();

    let total_files = stack.len();
    let mut count = 0;
    tx.send(WorkerStatus::new(0.0, component, *worker_id, BarColor::CYAN))?;
    while let Some(entry) = stack.next_file() {
        if config.station_name.is_none() && entry.station != station {
            log::warn!(
                "File {} belongs to station {}, but is being merged into {}",
                entry.path.to_string_lossy(),
                entry.station,
                station
            );
        }
        log::info!("Reading file {}", entry.path.to_string_lossy());
        let segment = RawSegment::read_with_start(&entry.path, entry.start_time, sampling_interval)?;
        let next_start = stack.peek_next().map(|next| next.start_time);

        if let Some(record) = assembler.push_segment(&segment, next_start)? {
            written.push(writer.write(&record)?);
        }

        count += 1;
        tx.send(WorkerStatus::new(
            count as f32 / total_files as f32,
            component,
            *worker_id,
            BarColor::CYAN,
        ))?;
    }

    if let Some(record) = assembler.finish() {
        written.push(writer.write(&record)?);
    }

    tx.send(WorkerStatus::new(1.0, component, *worker_id, BarColor::GREEN))?;
    log::info!(
        "Done with component {}; wrote {} day-file(s) to {}",
        component,
        writer.files_written(),
        writer.output_path().to_string_lossy()
    );
    Ok(written)
}

/// The function to be called by a separate thread (typically the CLI).
/// Processes every configured component in turn
pub fn process(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
) -> Result<Vec<PathBuf>, ProcessorError> {
    let components = config.components.clone();
    process_subset(config, tx, worker_id, components)
}

/// Process a subset of the components
pub fn process_subset(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
    subset: Vec<String>,
) -> Result<Vec<PathBuf>, ProcessorError> {
    config.validate()?;
    let station_config = config.load_station_config()?;
    let mut written: Vec<PathBuf> = Vec::new();
    for component in subset {
        log::info!("Processing component {}...", component);
        match process_component(
            &config,
            station_config.as_ref(),
            &component,
            &tx,
            &worker_id,
        ) {
            Ok(mut paths) => written.append(&mut paths),
            Err(e) => {
                let _ = tx.send(WorkerStatus::new(0.0, &component, worker_id, BarColor::RED));
                return Err(e);
            }
        }
        log::info!("Finished processing component {}.", component);
    }
    Ok(written)
}

/// Divide the components in to a set of subsets (per thread/worker)
pub fn create_subsets(config: &Config) -> Vec<Vec<String>> {
    let n_threads = config.n_threads.max(1) as usize;
    let mut subsets: Vec<Vec<String>> = vec![Vec::new(); n_threads];
    let n_subsets = subsets.len();

    for (idx, component) in config.components.iter().enumerate() {
        subsets[idx % n_subsets].push(component.clone())
    }

    subsets
}
