use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("State not registered: {name}")]
    StateNotFound { name: &'static str },

    #[error("Command not registered: {name}")]
    CommandNotFound { name: &'static str },

    #[error("State missing from command snapshot: {name}")]
    SnapshotMissing { name: &'static str },
}

impl Error {
    pub fn state_not_found(name: &'static str) -> Self {
        Self::StateNotFound { name }
    }

    pub fn command_not_found(name: &'static str) -> Self {
        Self::CommandNotFound { name }
    }

    pub fn snapshot_missing(name: &'static str) -> Self {
        Self::SnapshotMissing { name }
    }
}
