/// Event Stream Reader
///
/// Reads front-end events written as JSON lines, one event per line. Blank
/// lines and lines starting with `#` are skipped.

use crate::domain::events::FrontEndEvent;
use crate::error::{Error, Result};
use crate::ports::FrontEnd;

pub struct EventStreamFrontEnd;

impl FrontEnd for EventStreamFrontEnd {
    fn extract(&self, path: &str, source: &str) -> Result<Vec<FrontEndEvent>> {
        let mut events = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event = serde_json::from_str(line)
                .map_err(|e| Error::parse(path, format!("line {}: {}", idx + 1, e)))?;
            events.push(event);
        }
        Ok(events)
    }
}

/// Serialize events as JSON lines, the inverse of [`EventStreamFrontEnd`].
pub fn write_events(events: &[FrontEndEvent]) -> Result<String> {
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event)?);
        out.push('\n');
    }
    Ok(out)
}
