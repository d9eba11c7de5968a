//! Workspace export and import as `.zip` archives.
//!
//! An archive holds two entries:
//!
//! - `notes.json`: an [`ExportNotes`] document with the full note array.
//! - `favorites.json`: a JSON array of favorite note ids (optional on import).

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::note::Note;

/// Crate version written into every export.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Layout version of `notes.json`. Archives with a newer version are rejected.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

const NOTES_ENTRY: &str = "notes.json";
const FAVORITES_ENTRY: &str = "favorites.json";

/// Top-level JSON structure in `notes.json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportNotes {
    pub version: u32,
    pub app_version: String,
    pub notes: Vec<Note>,
}

/// Result returned after reading an export archive's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub app_version: String,
    pub note_count: usize,
    pub favorite_count: usize,
}

/// Everything read back from an archive, ready to hand to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedWorkspace {
    pub app_version: String,
    pub notes: Vec<Note>,
    pub favorites: Vec<String>,
}

/// Errors specific to export/import operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid export format: {0}")]
    InvalidFormat(String),
}

/// Writes `notes` and `favorites` to a new archive on `writer`.
///
/// # Errors
///
/// Returns [`ExportError::Zip`] or [`ExportError::Io`] if the archive cannot
/// be written.
pub fn export_workspace<W: Write + Seek>(
    writer: W,
    notes: &[Note],
    favorites: &[String],
) -> Result<(), ExportError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let document = serde_json::json!({
        "version": EXPORT_FORMAT_VERSION,
        "appVersion": APP_VERSION,
        "notes": notes,
    });
    zip.start_file(NOTES_ENTRY, options)?;
    zip.write_all(serde_json::to_string_pretty(&document)?.as_bytes())?;

    zip.start_file(FAVORITES_ENTRY, options)?;
    zip.write_all(serde_json::to_string(favorites)?.as_bytes())?;

    zip.finish()?;
    log::info!("Exported {} notes", notes.len());
    Ok(())
}

/// Reads archive metadata without applying anything.
///
/// # Errors
///
/// Returns [`ExportError::InvalidFormat`] if `notes.json` is missing or its
/// version is newer than this build understands.
pub fn peek_import<R: Read + Seek>(reader: R) -> Result<ImportResult, ExportError> {
    let workspace = import_workspace(reader)?;
    Ok(ImportResult {
        app_version: workspace.app_version,
        note_count: workspace.notes.len(),
        favorite_count: workspace.favorites.len(),
    })
}

/// Reads a full archive written by [`export_workspace`].
///
/// A missing `favorites.json` yields no favorites.
///
/// # Errors
///
/// Returns [`ExportError::InvalidFormat`] if `notes.json` is missing or its
/// version is newer than this build understands, and [`ExportError::Json`]
/// if either entry does not parse.
pub fn import_workspace<R: Read + Seek>(reader: R) -> Result<ImportedWorkspace, ExportError> {
    let mut archive = ZipArchive::new(reader)?;

    let notes_json = read_entry(&mut archive, NOTES_ENTRY)?
        .ok_or_else(|| ExportError::InvalidFormat(format!("missing {NOTES_ENTRY}")))?;
    let document: ExportNotes = serde_json::from_str(&notes_json)?;
    if document.version > EXPORT_FORMAT_VERSION {
        return Err(ExportError::InvalidFormat(format!(
            "unsupported export version {} (newest supported is {EXPORT_FORMAT_VERSION})",
            document.version
        )));
    }

    let favorites = match read_entry(&mut archive, FAVORITES_ENTRY)? {
        Some(json) => serde_json::from_str(&json)?,
        None => Vec::new(),
    };

    Ok(ImportedWorkspace {
        app_version: document.app_version,
        notes: document.notes,
        favorites,
    })
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExportError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(Some(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::note::WikiStatus;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use std::io::Cursor;

    fn note(id: &str, title: &str, parent: Option<&str>) -> Note {
        let at = Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap();
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("About {title}"),
            parent_id: parent.map(str::to_string),
            created_at: at,
            updated_at: at,
            tags: BTreeSet::from(["export".to_string()]),
            wiki_status: WikiStatus::Draft,
            contributors: BTreeSet::new(),
            version: 1,
            history: vec![],
            is_folder: false,
        }
    }

    fn archive_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_export_notes_serialization() {
        let export = ExportNotes {
            version: 1,
            app_version: "0.1.0".to_string(),
            notes: vec![],
        };
        let json = serde_json::to_string(&export).unwrap();
        assert!(json.contains("\"version\":1"));
        assert!(json.contains("\"appVersion\":\"0.1.0\""));
        assert!(json.contains("\"notes\":[]"));
    }

    #[test]
    fn test_export_then_import_file() {
        let notes = vec![note("a", "Alpha", None), note("b", "Beta", Some("a"))];
        let favorites = vec!["b".to_string()];

        let temp = tempfile::NamedTempFile::new().unwrap();
        export_workspace(temp.reopen().unwrap(), &notes, &favorites).unwrap();

        let imported = import_workspace(std::fs::File::open(temp.path()).unwrap()).unwrap();
        assert_eq!(imported.notes, notes);
        assert_eq!(imported.favorites, favorites);
        assert_eq!(imported.app_version, APP_VERSION);
    }

    #[test]
    fn test_peek_import_counts() {
        let mut buffer = Cursor::new(Vec::new());
        export_workspace(&mut buffer, &[note("a", "Alpha", None)], &[]).unwrap();
        buffer.set_position(0);

        let summary = peek_import(buffer).unwrap();
        assert_eq!(summary.note_count, 1);
        assert_eq!(summary.favorite_count, 0);
        assert_eq!(summary.app_version, APP_VERSION);
    }

    #[test]
    fn test_missing_notes_entry_is_invalid() {
        let bytes = archive_with(&[("favorites.json", "[]")]);
        let err = import_workspace(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ExportError::InvalidFormat(_)));
    }

    #[test]
    fn test_missing_favorites_entry_is_empty() {
        let bytes = archive_with(&[(
            "notes.json",
            r#"{"version":1,"appVersion":"0.0.9","notes":[]}"#,
        )]);
        let imported = import_workspace(Cursor::new(bytes)).unwrap();
        assert!(imported.notes.is_empty());
        assert!(imported.favorites.is_empty());
        assert_eq!(imported.app_version, "0.0.9");
    }

    #[test]
    fn test_newer_version_rejected() {
        let bytes = archive_with(&[(
            "notes.json",
            r#"{"version":2,"appVersion":"9.0.0","notes":[]}"#,
        )]);
        let err = import_workspace(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ExportError::InvalidFormat(_)));
    }

    #[test]
    fn test_not_a_zip() {
        let err = import_workspace(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, ExportError::Zip(_)));
    }
}
