//! Highscore persistence errors.

use thiserror::Error;

/// Errors surfaced by the highscore store.
///
/// Everything except [`HighscoreError::InvalidInput`] means the store is
/// unusable for the attempted operation. Nothing here is retried.
#[derive(Error, Debug)]
pub enum HighscoreError {
    #[error("highscore store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("failed to prepare highscore store location: {0}")]
    Io(#[from] std::io::Error),

    #[error("highscore store schema version {found} is newer than supported version {supported}")]
    IncompatibleSchema { found: i64, supported: i64 },

    #[error("highscore table is missing required columns: {missing}")]
    IncompatibleTable { missing: String },

    #[error("invalid highscore: {0}")]
    InvalidInput(String),
}

impl HighscoreError {
    /// True for failures that leave the store unusable, as opposed to a rejected record.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, HighscoreError::InvalidInput(_))
    }
}

pub type Result<T, E = HighscoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(!HighscoreError::InvalidInput("empty name".into()).is_unavailable());
        assert!(HighscoreError::IncompatibleSchema {
            found: 9,
            supported: 1
        }
        .is_unavailable());
        assert!(HighscoreError::IncompatibleTable {
            missing: "score".into()
        }
        .is_unavailable());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(HighscoreError::from(io).is_unavailable());
    }

    #[test]
    fn messages_name_the_versions() {
        let err = HighscoreError::IncompatibleSchema {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "highscore store schema version 3 is newer than supported version 1"
        );
    }
}
