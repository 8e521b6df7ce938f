use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Session;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file: {0}")]
    Io(#[from] io::Error),

    #[error("session file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads the session saved at login. A missing file means nobody is logged in.
pub fn load_session(path: &Path) -> Result<Option<Session>, SessionError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No session file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(None);
    }

    let session: Session = serde_json::from_str(&raw)?;
    if session.token.is_empty() {
        warn!("Session file at {} holds no token", path.display());
    }

    Ok(Some(session))
}
