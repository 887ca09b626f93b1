use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::error::ComponentStackError;
use super::filename::FileStamp;

/// A raw file queued for assembly along with the information decoded from its name
#[derive(Debug, Clone, PartialEq)]
pub struct StackEntry {
    pub path: PathBuf,
    pub station: String,
    pub start_time: f64,
}

/// The collection of all raw files recorded for one component (channel) of a station.
///
/// Files are ordered by the start time encoded in their names. Assembly must consume the
/// stack strictly in order, as continuity decisions look ahead to the following file.
#[derive(Debug)]
pub struct ComponentStack {
    pub component: String,
    pub file_stack: VecDeque<StackEntry>,
    pub total_stack_size_bytes: u64,
    parent_path: PathBuf,
}

impl ComponentStack {
    /// Create a new ComponentStack for a given component in a directory of raw files
    ///
    /// If `skip_malformed` is set, files whose names do not encode a timestamp are skipped
    /// with a warning instead of failing the stack.
    pub fn new(
        path: &Path,
        component: &str,
        skip_malformed: bool,
    ) -> Result<Self, ComponentStackError> {
        let raw_files = list_raw_files(path)?;
        let component_files = filter_component(&raw_files, component);
        if component_files.is_empty() {
            return Err(ComponentStackError::NoComponentFiles(
                component.to_string(),
                path.to_path_buf(),
            ));
        }

        let mut entries: Vec<StackEntry> = Vec::with_capacity(component_files.len());
        let mut total_stack_size_bytes = 0;
        for file in component_files {
            let stamp = match FileStamp::parse(&file) {
                Ok(s) => s,
                Err(e) if skip_malformed => {
                    log::warn!("Skipping file with unparseable name: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            total_stack_size_bytes += file.metadata()?.len();
            entries.push(StackEntry {
                path: file,
                station: stamp.station,
                start_time: stamp.start_time,
            });
        }

        if entries.is_empty() {
            return Err(ComponentStackError::NoComponentFiles(
                component.to_string(),
                path.to_path_buf(),
            ));
        }

        // Stable; files with equal start times keep their listing order
        entries.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        Ok(Self {
            component: component.to_lowercase(),
            file_stack: entries.into(),
            total_stack_size_bytes,
            parent_path: path.to_path_buf(),
        })
    }

    /// Take the next file in chronological order
    pub fn next_file(&mut self) -> Option<StackEntry> {
        self.file_stack.pop_front()
    }

    /// Look at the file following the one most recently taken, without consuming it
    pub fn peek_next(&self) -> Option<&StackEntry> {
        self.file_stack.front()
    }

    /// Station name of the earliest file in the stack
    pub fn first_station(&self) -> Option<&str> {
        self.file_stack.front().map(|e| e.station.as_str())
    }

    pub fn len(&self) -> usize {
        self.file_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_stack.is_empty()
    }

    pub fn parent_path(&self) -> &Path {
        &self.parent_path
    }
}

/// List every regular file of the form `*.??` in a directory, sorted by name
pub fn list_raw_files(path: &Path) -> Result<Vec<PathBuf>, ComponentStackError> {
    if !path.is_dir() {
        return Err(ComponentStackError::DirectoryNotFound(path.to_path_buf()));
    }

    let mut file_list: Vec<PathBuf> = Vec::new();
    for item in path.read_dir()? {
        let item_path = item?.path();
        if !item_path.is_file() {
            continue;
        }
        if raw_suffix(&item_path).is_some() {
            file_list.push(item_path);
        }
    }

    if file_list.is_empty() {
        return Err(ComponentStackError::NoMatchingFiles(path.to_path_buf()));
    }

    // read_dir order is platform dependent
    file_list.sort();
    Ok(file_list)
}

/// Select the files whose two character suffix matches a component, ignoring case
pub fn filter_component(files: &[PathBuf], component: &str) -> Vec<PathBuf> {
    let component = component.to_lowercase();
    files
        .iter()
        .filter(|f| raw_suffix(f).is_some_and(|s| s == component))
        .cloned()
        .collect()
}

fn raw_suffix(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if ext.chars().count() == 2 {
        Some(ext.to_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "1.0\n").unwrap();
    }

    #[test]
    fn test_stack_is_chronological() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "EDL.pb01130612100000.EX");
        touch(dir.path(), "EDL.pb01130612080000.ex");
        touch(dir.path(), "EDL.pb01130612090000.ex");
        touch(dir.path(), "EDL.pb01130612080000.ey");
        touch(dir.path(), "notes.txt");

        let mut stack = ComponentStack::new(dir.path(), "ex", false).unwrap();
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.first_station(), Some("PB01"));
        let mut starts = Vec::new();
        while let Some(entry) = stack.next_file() {
            starts.push(entry.start_time);
        }
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "EDL.pb01130612080000.bx");
        touch(dir.path(), "EDL.pb01130612090000.bx");

        let mut stack = ComponentStack::new(dir.path(), "bx", false).unwrap();
        let first = stack.next_file().unwrap();
        let next_start = stack.peek_next().unwrap().start_time;
        assert_eq!(next_start - first.start_time, 3600.0);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_missing_directory_and_component() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ComponentStack::new(&missing, "ex", false),
            Err(ComponentStackError::DirectoryNotFound(_))
        ));
        assert!(matches!(
            ComponentStack::new(dir.path(), "ex", false),
            Err(ComponentStackError::NoMatchingFiles(_))
        ));
        touch(dir.path(), "EDL.pb01130612080000.ey");
        assert!(matches!(
            ComponentStack::new(dir.path(), "ex", false),
            Err(ComponentStackError::NoComponentFiles(_, _))
        ));
    }

    #[test]
    fn test_malformed_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "EDL.pb01130612080000.tp");
        touch(dir.path(), "EDL.broken.tp");

        assert!(matches!(
            ComponentStack::new(dir.path(), "tp", false),
            Err(ComponentStackError::BadFilename(_))
        ));
        let stack = ComponentStack::new(dir.path(), "tp", true).unwrap();
        assert_eq!(stack.len(), 1);
    }
}
