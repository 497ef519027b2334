use std::error::Error;
use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::version::CURRENT_VERSION;

pub type ChainedResult<T> = Result<T, ChainedError>;

/// wrap any result into a ChainedError and add the given msg
#[macro_export]
macro_rules! wrap {
    ($result:expr, $msg:expr) => {
        $result.map_err(|err| $crate::error::ChainedError::wrap($msg, err.into()))
    };
}

pub trait ErrorWrap<T> {
    /// wrap ChainedResult error into a ChainedError and add the given msg
    fn wrap<S>(self, msg: S) -> ChainedResult<T>
    where
        S: Into<String>;
}

impl<T> ErrorWrap<T> for ChainedResult<T> {
    fn wrap<S>(self, msg: S) -> ChainedResult<T>
    where
        S: Into<String>,
    {
        self.map_err(|err| ChainedError::wrap(msg, err))
    }
}

/// Well known error codes from the CNI specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    IncompatibleCniVersion,
    UnsupportedField,
    InvalidEnvironmentVariables,
    IoFailure,
    DecodingFailure,
    InvalidNetworkConfig,
    TryAgainLater,
    Internal,
}

impl ErrorCode {
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::IncompatibleCniVersion => 1,
            ErrorCode::UnsupportedField => 2,
            ErrorCode::InvalidEnvironmentVariables => 4,
            ErrorCode::IoFailure => 5,
            ErrorCode::DecodingFailure => 6,
            ErrorCode::InvalidNetworkConfig => 7,
            ErrorCode::TryAgainLater => 11,
            ErrorCode::Internal => 999,
        }
    }
}

/// The main plugin error type
#[derive(Debug)]
pub enum ChainedError {
    // A string message reported to the runtime with a specific CNI error code
    Code(ErrorCode, String),
    // A chain of multiple errors
    Chain(String, Box<ChainedError>),

    Io(std::io::Error),

    Serde(serde_json::Error),
}

/// CNI error object, written to stdout when a command fails.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    #[serde(rename = "cniVersion")]
    pub cni_version: String,
    pub code: u32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ChainedError {
    pub fn code_msg<S>(code: ErrorCode, msg: S) -> ChainedError
    where
        S: Into<String>,
    {
        ChainedError::Code(code, msg.into())
    }

    pub fn wrap<S>(msg: S, chained: ChainedError) -> ChainedError
    where
        S: Into<String>,
    {
        ChainedError::Chain(msg.into(), Box::new(chained))
    }

    /// The CNI error code reported to the runtime for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ChainedError::Code(code, _) => *code,
            ChainedError::Chain(_, inner) => inner.code(),
            ChainedError::Io(_) => ErrorCode::IoFailure,
            ChainedError::Serde(_) => ErrorCode::DecodingFailure,
        }
    }

    /// unwrap the chain error recursively until we a non chain type error
    pub fn unwrap(&self) -> &ChainedError {
        match self {
            ChainedError::Chain(_, inner) => inner.unwrap(),
            _ => self,
        }
    }

    pub fn to_json(&self) -> JsonError {
        let details = match self {
            ChainedError::Chain(_, inner) => Some(inner.unwrap().to_string()),
            _ => None,
        };
        JsonError {
            cni_version: CURRENT_VERSION.to_string(),
            code: self.code().code(),
            msg: self.to_string(),
            details,
        }
    }

    /// Print the error in the JSON format the container runtime expects
    /// from a failed CNI plugin.
    pub fn print_json(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let to_json = self.to_json();
        let line = serde_json::to_string(&to_json).unwrap_or(format!(
            "Failed to serialize error message: {}",
            to_json.msg
        ));
        writeln!(out, "{}", line)?;
        out.flush()
    }

    /// Get the exit code the plugin process should exit with
    pub fn get_exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for ChainedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainedError::Code(_, s) => write!(f, "{}", s),
            ChainedError::Chain(s, e) => write!(f, "{}: {}", s, e),
            ChainedError::Io(e) => write!(f, "IO error: {}", e),
            ChainedError::Serde(e) => write!(f, "JSON Decoding error: {}", e),
        }
    }
}

impl Error for ChainedError {}

impl From<std::io::Error> for ChainedError {
    fn from(err: std::io::Error) -> ChainedError {
        ChainedError::Io(err)
    }
}

impl From<serde_json::Error> for ChainedError {
    fn from(err: serde_json::Error) -> ChainedError {
        ChainedError::Serde(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_keeps_inner_code() {
        let err = ChainedError::wrap(
            "could not parse prevResult",
            ChainedError::code_msg(ErrorCode::IncompatibleCniVersion, "unsupported"),
        );
        assert_eq!(err.code(), ErrorCode::IncompatibleCniVersion);
        assert_eq!(err.to_string(), "could not parse prevResult: unsupported");
    }

    #[test]
    fn test_code_numbers() {
        for (code, num) in [
            (ErrorCode::IncompatibleCniVersion, 1),
            (ErrorCode::UnsupportedField, 2),
            (ErrorCode::InvalidEnvironmentVariables, 4),
            (ErrorCode::IoFailure, 5),
            (ErrorCode::DecodingFailure, 6),
            (ErrorCode::InvalidNetworkConfig, 7),
            (ErrorCode::TryAgainLater, 11),
            (ErrorCode::Internal, 999),
        ] {
            assert_eq!(code.code(), num, "{:?}", code);
        }
    }

    #[test]
    fn test_io_error_code() {
        let err: ChainedError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(err.code().code(), 5);
    }

    #[test]
    fn test_print_json() {
        let err = ChainedError::wrap(
            "failed to write result",
            ChainedError::code_msg(ErrorCode::IoFailure, "broken pipe"),
        );
        let mut out = Vec::new();
        err.print_json(&mut out).unwrap();

        let parsed: JsonError = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.cni_version, CURRENT_VERSION);
        assert_eq!(parsed.code, 5);
        assert_eq!(parsed.msg, "failed to write result: broken pipe");
        assert_eq!(parsed.details.as_deref(), Some("broken pipe"));
    }

    #[test]
    fn test_wrap_macro() {
        let res: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "nope"));
        let err = wrap!(res, "read stdin").unwrap_err();
        assert_eq!(err.to_string(), "read stdin: IO error: nope");
        assert_eq!(err.code(), ErrorCode::IoFailure);
    }
}
