//! Error type shared by every fallible operation in the core.
//!
//! Most of phosphor is decoration and cannot fail in a user-visible way.
//! The few paths that touch the outside world (config and script files, the
//! clipboard, the platform URL handler, audio sinks) report through [`Error`].

use std::path::PathBuf;

/// Core error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown intensity profile '{0}' (expected soft, normal, strong or extreme)")]
    UnknownProfile(String),

    #[error("invalid boot script: {0}")]
    InvalidScript(String),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("could not hand off to the game client: {0}")]
    Launch(String),

    #[error("audio cue dropped: {0}")]
    Audio(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_message_lists_choices() {
        let msg = Error::UnknownProfile("loud".into()).to_string();
        assert!(msg.contains("loud"));
        assert!(msg.contains("extreme"));
    }

    #[test]
    fn io_error_carries_path() {
        let err = Error::io(
            "/tmp/nope.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/tmp/nope.json"));
    }
}
