//! Utility functions for timestamps, log truncation, URL bases and output
//! path checks.

use chrono::Local;
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

/// Current local time as `YYYY-MM-DD HH:MM:SS`, used to stamp output documents.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current local time in ISO-8601 with microseconds and no offset, used
/// when an item carries no upstream time.
pub fn now_iso() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Parse a configured base URL so that relative joins append to its path.
///
/// `Url::join` replaces the last path segment unless the base ends in `/`,
/// so `http://proxy/gemini` is normalized to `http://proxy/gemini/`.
///
/// # Examples
///
/// ```ignore
/// let base = base_url("http://proxy/gemini")?;
/// assert_eq!(base.join("v1beta")?.as_str(), "http://proxy/gemini/v1beta");
/// ```
pub fn base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Scratch file used by [`ensure_writable_parent`] inside `dir`.
fn check_file_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        ".{}-write-check-{}",
        env!("CARGO_PKG_NAME"),
        std::process::id()
    ))
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Missing directories are created, matching where the output document will
/// be written. Writability is checked by creating a fresh scratch file (never
/// an existing one) and removing it again.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, is not writable
/// (permission denied, read-only filesystem, etc.), or already holds a file
/// at the scratch path.
#[instrument(level = "info", skip_all, fields(file = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.exists() {
        info!(dir = %dir.display(), "Creating output directory");
    }
    fs::create_dir_all(dir).await?;

    let scratch = check_file_path(dir);
    stdfs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&scratch)?;
    if let Err(e) = stdfs::remove_file(&scratch) {
        warn!(path = %scratch.display(), error = %e, "Failed to remove write check file");
    }
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        // "é" is two bytes; cutting at 3 would split the second one.
        let result = truncate_for_log("éééé", 3);
        assert_eq!(result, "é…(+6 bytes)");
    }

    #[test]
    fn test_now_timestamp_format() {
        let ts = now_timestamp();
        assert!(NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_now_iso_format() {
        let ts = now_iso();
        assert!(NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let base = base_url("http://proxy.local/gemini").unwrap();
        assert_eq!(base.as_str(), "http://proxy.local/gemini/");
        assert_eq!(
            base.join("v1beta/models").unwrap().as_str(),
            "http://proxy.local/gemini/v1beta/models"
        );
    }

    #[test]
    fn test_base_url_bare_host_and_trailing_slash() {
        assert_eq!(base_url("https://api.apify.com").unwrap().as_str(), "https://api.apify.com/");
        assert_eq!(base_url("http://proxy.local/a/").unwrap().as_str(), "http://proxy.local/a/");
        assert!(base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        ensure_writable_parent(&nested.join("out.json")).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(stdfs::read_dir(&nested).unwrap().count(), 0);

        // A second check in the same directory still works.
        ensure_writable_parent(&nested.join("out.json")).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_never_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let scratch = check_file_path(dir.path());
        stdfs::write(&scratch, "keep me").unwrap();

        assert!(ensure_writable_parent(&dir.path().join("out.json")).await.is_err());
        assert_eq!(stdfs::read_to_string(&scratch).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_bare_filename() {
        ensure_writable_parent(Path::new("translated_news.json"))
            .await
            .unwrap();
    }
}
