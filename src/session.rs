//! Session capture from the local Firefox cookie store.
//!
//! Copies the YouTube cookies of the default Firefox profile into a storage-state
//! file (`<session_dir>/Default/state.json`) that an automated browser context can
//! be started from.

use crate::{HistoryError, Result};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Cookie host filter applied to `moz_cookies`
const COOKIE_HOST_PATTERN: &str = "%youtube.com%";

/// Expiry values further out than this are treated as session cookies
const MAX_EXPIRY_SECS: i64 = 10 * 365 * 86_400;

/// Profile directory suffixes Firefox uses for the default profile
const DEFAULT_PROFILE_SUFFIXES: [&str; 2] = [".default-release", ".default"];

/// One cookie in storage-state form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Unix seconds, or -1 for a session cookie
    pub expires: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
}

/// Saved browser session: cookies plus per-origin storage
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageState {
    pub cookies: Vec<BrowserCookie>,
    #[serde(default)]
    pub origins: Vec<Value>,
}

/// Platform location of the Firefox profiles directory
pub fn firefox_profiles_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir().map(|dir| dir.join("Mozilla").join("Firefox").join("Profiles"))
    } else if cfg!(target_os = "macos") {
        dirs::config_dir().map(|dir| dir.join("Firefox").join("Profiles"))
    } else {
        dirs::home_dir().map(|dir| dir.join(".mozilla").join("firefox"))
    }
}

/// Find `cookies.sqlite` in the first default profile under `profiles_dir`
pub fn find_cookie_database(profiles_dir: &Path) -> Option<PathBuf> {
    WalkDir::new(profiles_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            DEFAULT_PROFILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
        .map(|entry| entry.path().join("cookies.sqlite"))
        .find(|path| path.is_file())
}

/// Clamp a Firefox expiry to what a browser context accepts
pub fn normalize_expiry(expiry: Option<i64>, now: i64) -> i64 {
    match expiry {
        Some(expiry) if expiry >= 0 && expiry <= now + MAX_EXPIRY_SECS => expiry,
        _ => -1,
    }
}

/// Read YouTube cookies from a Firefox cookie database.
///
/// The database is copied first since a running Firefox keeps it locked.
pub fn read_youtube_cookies(db_path: &Path, now: i64) -> Result<Vec<BrowserCookie>> {
    let copy = NamedTempFile::new()?;
    std::fs::copy(db_path, copy.path())?;
    debug!("Copied cookie database to {}", copy.path().display());

    let conn = Connection::open_with_flags(copy.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(
        "SELECT name, value, host, path, expiry, isSecure, isHttpOnly \
         FROM moz_cookies WHERE host LIKE ?1",
    )?;

    let cookies = stmt
        .query_map([COOKIE_HOST_PATTERN], |row| {
            Ok(BrowserCookie {
                name: row.get(0)?,
                value: row.get(1)?,
                domain: row.get(2)?,
                path: row.get(3)?,
                expires: normalize_expiry(row.get::<_, Option<i64>>(4)?, now),
                secure: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
                http_only: row.get::<_, Option<i64>>(6)?.unwrap_or(0) != 0,
                same_site: "Lax".to_string(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(cookies)
}

/// Location of the storage-state file inside a session directory
pub fn state_path(session_dir: &Path) -> PathBuf {
    session_dir.join("Default").join("state.json")
}

/// Write a storage state into `session_dir`, returning the file path
pub fn write_storage_state(session_dir: &Path, state: &StorageState) -> Result<PathBuf> {
    let path = state_path(session_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_vec(state)?)?;
    Ok(path)
}

/// Read the storage state saved in `session_dir`
pub async fn load_storage_state(session_dir: &Path) -> Result<StorageState> {
    let path = state_path(session_dir);
    if !path.exists() {
        return Err(HistoryError::Session(format!(
            "No saved session at {}; run extract-cookie first",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Copy YouTube cookies from Firefox into `session_dir`.
/// Returns the number of cookies captured.
pub fn extract_firefox_session(profiles_dir: Option<&Path>, session_dir: &Path) -> Result<usize> {
    let profiles_dir = match profiles_dir {
        Some(dir) => dir.to_path_buf(),
        None => firefox_profiles_dir()
            .ok_or_else(|| HistoryError::Session("Cannot determine the Firefox profiles directory".to_string()))?,
    };

    if !profiles_dir.is_dir() {
        return Err(HistoryError::Session(format!(
            "Firefox profiles directory not found: {}",
            profiles_dir.display()
        )));
    }

    let db_path = find_cookie_database(&profiles_dir).ok_or_else(|| {
        HistoryError::Session(format!(
            "No cookies.sqlite found in a default profile under {}",
            profiles_dir.display()
        ))
    })?;
    info!("🍪 Reading cookies from {}", db_path.display());

    let now = chrono::Utc::now().timestamp();
    let cookies = read_youtube_cookies(&db_path, now)?;
    if cookies.is_empty() {
        warn!("No YouTube cookies in {}", db_path.display());
        return Err(HistoryError::Session(
            "Firefox has no YouTube cookies; open YouTube in Firefox and log in once".to_string(),
        ));
    }

    let count = cookies.len();
    let state = StorageState {
        cookies,
        origins: Vec::new(),
    };
    let path = write_storage_state(session_dir, &state)?;
    info!("✅ Saved {} YouTube cookies to {}", count, path.display());

    Ok(count)
}
