pub mod stdin;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Load typed input from `--input <file>` or, failing that, piped stdin.
pub fn load<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        read_json(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json> or stdin required for {}", command).into())
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let file = resolve_path(Path::new(path))?;
    let contents = fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
    tracing::debug!(path = %file.display(), bytes = contents.len(), "read portfolio input");
    serde_json::from_str(&contents)
        .map_err(|e| format!("Invalid portfolio input in '{}': {}", file.display(), e).into())
}

/// Relative paths resolve against the working directory.
fn resolve_path(path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    if !file.is_file() {
        let reason = if file.exists() { "Not a file" } else { "File not found" };
        return Err(format!("{}: {}", reason, file.display()).into());
    }
    Ok(file)
}
