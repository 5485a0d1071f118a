//! Export file discovery and loading.
//!
//! Reads the `conversations.json` file of a chat export and validates that its
//! top level is a sequence of conversation entries. Individual entries are
//! left as raw [`serde_json::Value`]s for the extractor.

use std::path::{Path, PathBuf};

use recap_core::error::{RecapError, Result};
use serde_json::Value;
use tracing::debug;

/// File name of the conversation list inside an export archive.
pub const EXPORT_FILE_NAME: &str = "conversations.json";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find `conversations.json` under `dir`.
///
/// The shallowest match wins; matches at the same depth are ordered by path.
/// Returns `None` when the directory holds no export file.
pub fn find_export_file(dir: &Path) -> Option<PathBuf> {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == EXPORT_FILE_NAME)
        .min_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path().cmp(b.path())))
        .map(|entry| entry.into_path())
}

/// Resolve a user-supplied path to the export file to read.
///
/// A file path is returned as-is; a directory is searched with
/// [`find_export_file`].
pub fn resolve_export_path(path: &Path) -> Result<PathBuf> {
    let meta = std::fs::metadata(path).map_err(|source| RecapError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    if meta.is_dir() {
        return find_export_file(path).ok_or_else(|| RecapError::ExportNotFound(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

/// Parse raw export bytes into the list of top-level conversation entries.
///
/// Fails with [`RecapError::JsonParse`] for malformed JSON and with
/// [`RecapError::Format`] when the document is not a JSON array. An empty
/// array is a valid (empty) export.
pub fn parse_export(bytes: &[u8]) -> Result<Vec<Value>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(RecapError::Format("file is empty".to_string()));
    }

    match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(entries) => Ok(entries),
        other => Err(RecapError::Format(format!(
            "expected a JSON array of conversations, found {}",
            json_kind(&other)
        ))),
    }
}

/// Load and validate the export at `path` (file or export directory).
pub fn load_export(path: &Path) -> Result<Vec<Value>> {
    let file_path = resolve_export_path(path)?;
    let bytes = std::fs::read(&file_path).map_err(|source| RecapError::FileRead {
        path: file_path.clone(),
        source,
    })?;

    let entries = parse_export(&bytes)?;
    debug!(
        "Loaded {} entries ({} bytes) from {}",
        entries.len(),
        bytes.len(),
        file_path.display()
    );
    Ok(entries)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    // ── parse_export ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_export_array() {
        let entries = parse_export(br#"[{"id": "a"}, {"id": "b"}]"#).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_export_empty_array() {
        assert!(parse_export(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_export_strips_bom() {
        let entries = parse_export(b"\xEF\xBB\xBF[{\"id\": \"a\"}]").unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_parse_export_object_is_format_error() {
        let err = parse_export(br#"{"conversations": []}"#).unwrap_err();
        assert!(matches!(err, RecapError::Format(_)));
        assert!(err.to_string().contains("found an object"));
    }

    #[test]
    fn test_parse_export_invalid_json() {
        let err = parse_export(b"[{\"id\": ").unwrap_err();
        assert!(matches!(err, RecapError::JsonParse(_)));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_parse_export_empty_input() {
        let err = parse_export(b"  \n").unwrap_err();
        assert!(matches!(err, RecapError::Format(_)));
    }

    #[test]
    fn test_parse_export_keeps_non_object_entries() {
        // Per-entry shape is the extractor's concern, not the loader's.
        let entries = parse_export(br#"[1, "two", {"id": "x"}]"#).unwrap();
        assert_eq!(entries.len(), 3);
    }

    // ── find_export_file / resolve_export_path ────────────────────────────────

    #[test]
    fn test_find_export_file_prefers_shallowest() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "nested/deeper/conversations.json", "[]");
        let top = write_file(dir.path(), "conversations.json", "[]");

        assert_eq!(find_export_file(dir.path()), Some(top));
    }

    #[test]
    fn test_find_export_file_nested_only() {
        let dir = TempDir::new().unwrap();
        let nested = write_file(dir.path(), "b/conversations.json", "[]");
        write_file(dir.path(), "a/chat.html", "<html>");

        assert_eq!(find_export_file(dir.path()), Some(nested));
    }

    #[test]
    fn test_find_export_file_ties_broken_by_path() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "zeta/conversations.json", "[]");
        let alpha = write_file(dir.path(), "alpha/conversations.json", "[]");

        assert_eq!(find_export_file(dir.path()), Some(alpha));
    }

    #[test]
    fn test_resolve_export_path_missing_directory_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "user.json", "{}");
        let err = resolve_export_path(dir.path()).unwrap_err();
        assert!(matches!(err, RecapError::ExportNotFound(_)));
    }

    #[test]
    fn test_resolve_export_path_nonexistent() {
        let err = resolve_export_path(Path::new("/tmp/does-not-exist-chat-recap-xyz")).unwrap_err();
        assert!(matches!(err, RecapError::FileRead { .. }));
    }

    // ── load_export ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_export_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "export.json", r#"[{"id": "a"}]"#);
        assert_eq!(load_export(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_load_export_from_directory() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "conversations.json", r#"[{"id": "a"}, {"id": "b"}]"#);
        assert_eq!(load_export(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_load_export_wrong_shape() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "conversations.json", "42");
        let err = load_export(&path).unwrap_err();
        assert!(matches!(err, RecapError::Format(_)));
    }
}
