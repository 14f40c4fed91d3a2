//! Checks applied to an entry's path before it is handed to an OS
//! launcher command.

use std::path::Path;

const MAX_PATH_LENGTH: usize = 4096;

/// Rejects paths that should never reach a spawned command: overlong,
/// null bytes, traversal sequences, shell expansion characters.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(format!("Path too long (max {MAX_PATH_LENGTH} bytes)"));
    }

    if path.bytes().any(|b| b == 0) {
        return Err("Path contains null bytes".to_string());
    }

    if path.contains("../") || path.contains("..\\") {
        return Err("Path traversal detected (../)".to_string());
    }

    if path.contains('$') || path.contains('`') {
        return Err("Path contains suspicious characters".to_string());
    }

    Ok(())
}

/// The launcher commands silently no-op on some platforms when given a
/// dead path, so existence is checked up front.
pub fn verify_path_exists(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Path does not exist: {}", path.display()));
    }

    Ok(())
}
