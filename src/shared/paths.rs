use std::path::{Path, PathBuf};

/// Resolve the user's home directory, preferring the environment so tests can
/// redirect it without touching the real account.
pub fn get_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .or_else(dirs::home_dir)
}

/// Compact display form of a directory: home collapses to `~`, anything else
/// reduces to its final component.
pub fn short_dir(dir: &Path) -> String {
    if let Some(home) = get_home_dir()
        && dir == home
    {
        return "~".to_string();
    }
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.to_string_lossy().to_string())
}
