use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("client executable not found: `{0}`")]
    ExecutableNotFound(PathBuf),

    #[error("client executable is not a regular file: `{0}`")]
    ExecutableNotFile(PathBuf),

    #[error("client executable is not invocable (missing execute permission): `{0}`")]
    ExecutableNotInvocable(PathBuf),

    #[error("`clients` must be a positive integer")]
    InvalidClientCount,

    #[error("`duration` must be a positive duration")]
    InvalidDuration,
}

impl Error {
    /// Launch-time failures: nothing was started and the benchmark must not proceed.
    #[must_use]
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            Self::ExecutableNotFound(_) | Self::ExecutableNotFile(_) | Self::ExecutableNotInvocable(_)
        )
    }
}
