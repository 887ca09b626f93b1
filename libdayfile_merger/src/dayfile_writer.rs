use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::dayfile::DayFileRecord;
use super::error::DayFileWriterError;

/// Writes DayFileRecords as ASCII day-files into an output directory.
///
/// Each record is written to a hidden temporary file in the output directory and renamed
/// into place once complete, so a failed run never leaves a truncated day-file behind.
#[derive(Debug)]
pub struct DayFileWriter {
    output_path: PathBuf,
    files_written: usize,
}

impl DayFileWriter {
    /// Create the writer, creating the output directory if needed
    pub fn new(output_path: &Path) -> Result<Self, DayFileWriterError> {
        if output_path.exists() && !output_path.is_dir() {
            return Err(DayFileWriterError::BadOutputPath(output_path.to_path_buf()));
        }
        std::fs::create_dir_all(output_path)?;
        Ok(Self {
            output_path: output_path.to_path_buf(),
            files_written: 0,
        })
    }

    /// Write a record, returning the path of the finished day-file
    pub fn write(&mut self, record: &DayFileRecord) -> Result<PathBuf, DayFileWriterError> {
        let file_name = record.file_name();
        let final_path = self.output_path.join(&file_name);
        let temp_path = self.output_path.join(format!(".{file_name}.tmp"));

        if let Err(e) = write_contents(&temp_path, record) {
            // Best effort; the temporary may not exist if creation itself failed
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
        if let Err(e) = std::fs::rename(&temp_path, &final_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        self.files_written += 1;

        let size = final_path.metadata()?.len();
        log::info!(
            "Wrote day-file {} ({} rows, {})",
            final_path.to_string_lossy(),
            record.n_rows(),
            human_bytes::human_bytes(size as f64)
        );
        Ok(final_path)
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn files_written(&self) -> usize {
        self.files_written
    }
}

fn write_contents(path: &Path, record: &DayFileRecord) -> Result<(), DayFileWriterError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", record.header)?;
    for row in record.array.rows() {
        writeln!(writer, "{} {}", row[0], row[1])?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
