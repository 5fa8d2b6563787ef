//! Pretty-printed JSON array output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use super::StorageError;

/// Write records as a JSON array with two-space indentation, creating
/// parent directories as needed. Replaces any existing file.
pub fn write_json<T: Serialize>(records: &[T], path: &Path) -> Result<usize, StorageError> {
    debug!("Writing {} records to {:?}", records.len(), path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;

    info!("Data successfully written to {:?}", path);
    Ok(records.len())
}
