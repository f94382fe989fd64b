//! CSV rendering and atomic file output

use super::row::OutputRow;
use super::ExportError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Column names, in output order.
pub const HEADER: [&str; 9] = [
    "Title",
    "Authors",
    "Publication Name",
    "Publication Date",
    "DOI",
    "Summary",
    "Hypotheses",
    "Methods",
    "Findings",
];

/// Write the header and one line per row to `writer`, in the given order.
pub fn write_rows<W: Write>(rows: &[OutputRow], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for row in rows {
        csv.write_record(row.cells())?;
    }
    csv.flush()?;
    Ok(())
}

/// Render the full table, then replace `destination` with it in one step.
///
/// The table is built in memory and written to a temporary file next to the
/// destination before being renamed over it, so a failed export never leaves
/// a partial file behind.
pub fn export(rows: &[OutputRow], destination: &Path) -> Result<(), ExportError> {
    let mut buffer = Vec::new();
    write_rows(rows, &mut buffer)?;

    let persist_err = |source: std::io::Error| ExportError::Persist {
        path: destination.to_path_buf(),
        source,
    };

    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = staging_file(dir).map_err(persist_err)?;
    staged.write_all(&buffer).map_err(persist_err)?;
    staged.as_file().sync_all().map_err(persist_err)?;

    if let Ok(existing) = fs::metadata(destination) {
        staged
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(persist_err)?;
    }

    staged
        .persist(destination)
        .map_err(|e| persist_err(e.error))?;

    tracing::debug!(path = %destination.display(), rows = rows.len(), bytes = buffer.len(), "table written");
    Ok(())
}

/// Temp file that a fresh destination inherits its mode from.
///
/// On unix it is opened with 0o666 so the umask applies, as it would for a
/// plain create. Existing destinations keep their own mode (see `export`).
#[cfg(unix)]
fn staging_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    Builder::new()
        .prefix(".litreview-")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn staging_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    Builder::new().prefix(".litreview-").tempfile_in(dir)
}
