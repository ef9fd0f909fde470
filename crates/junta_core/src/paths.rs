use std::path::{Path, PathBuf};

/// Data directory for cached state (~/.junta unless JUNTA_DATA_DIR is set).
pub fn junta_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("JUNTA_DATA_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".junta")
}

/// Ensure the data directory exists.
pub fn ensure_junta_dir() -> std::io::Result<PathBuf> {
    let dir = junta_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load a JSON state file.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    if !path.exists() {
        return Err(format!("State file not found: {}", path.display()));
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read state file: {e}"))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse state file: {e}"))
}

/// Save a JSON state file, creating parent directories as needed.
pub fn save_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory: {e}"))?;
    }
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize state: {e}"))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write state file: {e}"))
}
