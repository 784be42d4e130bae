//! Model cache discovery
//!
//! fastembed downloads model weights on first use; this decides where they
//! are kept so every process on the host shares one copy.

use crate::error::{Result, VectorError};
use std::path::{Path, PathBuf};

/// Find the fastembed cache directory with priority:
/// 1. Explicit override (CLI flag)
/// 2. AIRROUTE_MODELS_PATH environment variable
/// 3. FASTEMBED_CACHE_PATH environment variable
/// 4. User home directory (~/.airroute/models)
///
/// The directory is created if it does not exist yet.
pub fn find_model_cache_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        log::info!("Using model cache from configuration: {}", path.display());
        return ensure_dir(path.to_path_buf());
    }

    if let Ok(models_path) = std::env::var("AIRROUTE_MODELS_PATH") {
        if !models_path.trim().is_empty() {
            log::info!("Using AIRROUTE_MODELS_PATH: {}", models_path);
            return ensure_dir(PathBuf::from(models_path));
        }
        log::warn!("AIRROUTE_MODELS_PATH is set but empty, ignoring");
    }

    if let Ok(cache_path) = std::env::var("FASTEMBED_CACHE_PATH") {
        if !cache_path.trim().is_empty() {
            log::info!("Using FASTEMBED_CACHE_PATH: {}", cache_path);
            return ensure_dir(PathBuf::from(cache_path));
        }
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        let user_path = PathBuf::from(home).join(".airroute").join("models");
        log::info!("Using user model cache: {}", user_path.display());
        return ensure_dir(user_path);
    }

    Err(VectorError::invalid_path(
        "No model cache directory available. Checked:\n\
         - AIRROUTE_MODELS_PATH environment variable\n\
         - FASTEMBED_CACHE_PATH environment variable\n\
         - ~/.airroute/models",
    ))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&path)?;
    Ok(path)
}
