use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Current version of the preferences file format
pub const PREFERENCES_VERSION: &str = "1.0.0";

/// How long a successful list fetch stays fresh (5 minutes)
pub const CACHE_WINDOW: Duration = Duration::from_secs(300);

/// Debounce window for structured filter changes
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Debounce window for free-text search keystrokes
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Get the path to the Dealflow directory (~/.dealflow)
pub fn dealflow_dir() -> PathBuf {
    // DEALFLOW_DIR wins outright (useful for tests)
    if let Ok(dir) = env::var("DEALFLOW_DIR") {
        return PathBuf::from(dir);
    }
    // Then HOME, then the dirs crate for normal usage
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".dealflow")
    } else {
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".dealflow")
    }
}

/// Get the path to the preferences file (~/.dealflow/preferences.json)
pub fn preferences_file() -> PathBuf {
    dealflow_dir().join("preferences.json")
}
