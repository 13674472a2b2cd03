use rtpbench_core::AggregateReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every client succeeded.
    Success = 0,

    /// Some clients failed (non-zero exit, timeout); at least one succeeded.
    ClientsFailed = 10,

    /// No client succeeded.
    NoSuccessfulClients = 11,

    /// Invalid CLI/config (bad flags, invalid durations, zero clients, etc.).
    InvalidInput = 30,

    /// The client executable is missing or not invocable; no client was started.
    LaunchFailure = 31,

    /// Internal/runtime error (IO errors writing logs, reading captures, etc.).
    RuntimeError = 40,

    /// Interrupted by Ctrl-C; running clients were killed.
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn from_report(report: &AggregateReport) -> Self {
        if report.successful_count == 0 {
            Self::NoSuccessfulClients
        } else if report.all_succeeded() {
            Self::Success
        } else {
            Self::ClientsFailed
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.as_u8())
    }
}
