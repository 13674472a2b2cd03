use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    LaunchFailure(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::LaunchFailure(_) => ExitCode::LaunchFailure,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::LaunchFailure(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<rtpbench_core::Error> for RunError {
    fn from(err: rtpbench_core::Error) -> Self {
        use rtpbench_core::Error;

        match err {
            Error::InvalidClientCount | Error::InvalidDuration => Self::InvalidInput(err.into()),
            err if err.is_launch_failure() => Self::LaunchFailure(err.into()),
            err => Self::RuntimeError(err.into()),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
