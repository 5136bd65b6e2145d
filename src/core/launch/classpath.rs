// ─── Classpath Builder ───
// Joins classpath entries into the single `-cp` argument value.

use std::path::Path;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Platform path-list separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Joins `entries` in order. Directories become `<dir>/*` so every archive
/// inside them is picked up.
pub fn build_classpath<P: AsRef<Path>>(entries: &[P]) -> LauncherResult<String> {
    if entries.is_empty() {
        return Err(LauncherError::EmptyClasspath);
    }

    let classpath = entries
        .iter()
        .map(|entry| classpath_entry(entry.as_ref()))
        .collect::<Vec<_>>()
        .join(get_classpath_separator());

    debug!("Classpath: {} entries, len={}", entries.len(), classpath.len());
    Ok(classpath)
}

fn classpath_entry(path: &Path) -> String {
    let text = safe_path_str(path);
    if path.is_dir() {
        format!("{}/*", text.trim_end_matches(['/', '\\']))
    } else {
        text
    }
}

/// Path as a string without the Windows extended-length prefix, which the
/// runtime's classpath parser does not understand.
pub fn safe_path_str(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
