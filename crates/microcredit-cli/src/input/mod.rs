pub mod file;
pub mod policy;

use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Resolve a command's JSON input: `--input` file first, then piped stdin.
/// Returns `None` when neither is present so the caller can fall back to flags.
pub fn read_command_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }

    // Interactive terminal: nothing is being piped in
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: T =
        serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse stdin: {e}"))?;
    Ok(Some(value))
}
