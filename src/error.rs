use std::io;

use thiserror::Error;

/// Failure to read the raw idle/kernel/user tick counters.
///
/// A failed read skips the current report cycle; it never stops the loop.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("cpu counter read failed (os error {code})")]
    Os { code: i32 },
    #[error("cpu counter source returned malformed data: {0}")]
    Malformed(String),
    #[error("raw cpu counters are not available on this platform")]
    Unsupported,
}

impl CounterError {
    pub fn from_io(err: &io::Error) -> Self {
        CounterError::Os {
            code: err.raw_os_error().unwrap_or(-1),
        }
    }

    /// Platform error code for diagnostics, when one exists.
    pub fn code(&self) -> Option<i32> {
        match self {
            CounterError::Os { code } => Some(*code),
            _ => None,
        }
    }
}

/// Failure of an external query (subprocess, sysfs read) or of parsing its output.
///
/// Consumers degrade the affected field to "unknown"/"unavailable".
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("query is not supported on this platform")]
    Unsupported,
    #[error("field `{0}` missing from query output")]
    ParseMismatch(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_error_keeps_platform_code() {
        let err = CounterError::from_io(&io::Error::from_raw_os_error(13));
        assert_eq!(err.code(), Some(13));
        assert!(err.to_string().contains("os error 13"));
    }

    #[test]
    fn non_os_errors_have_no_code() {
        assert_eq!(CounterError::Unsupported.code(), None);
        assert_eq!(CounterError::Malformed("x".into()).code(), None);
    }

    #[test]
    fn parse_mismatch_names_field() {
        let err = QueryError::ParseMismatch("CookedValue");
        assert_eq!(err.to_string(), "field `CookedValue` missing from query output");
    }
}
