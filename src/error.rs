use std::fmt;
use std::io;

use http::StatusCode;

/// Error type for callstream
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum Error {
    Io(io::ErrorKind, String),
    Transport(String),
    Conversion(String),
    Canceled,
    AlreadyExecuted,
    Http(StatusCode),
    BadSuccessStatus(StatusCode),
    BadErrorStatus(StatusCode),
    UnsupportedReturnType(String),
    BadReturnType(String),
    WorkerUnavailable(String),
    HttpParseFail(String),
    HttpParseTooManyHeaders,
    UnsupportedVersion,
    IncompleteResponse,
    BadContentLengthHeader,
}

impl Error {
    /// Tell if this error means the call could not be executed to completion.
    ///
    /// These are the failures a `Result` stream delivers as values, and the only ones a
    /// `Response` stream terminates with. [`Error::Http`] is not one of them, it is raised
    /// from a completed exchange.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Io(_, _)
                | Error::Transport(_)
                | Error::Conversion(_)
                | Error::Canceled
                | Error::HttpParseFail(_)
                | Error::HttpParseTooManyHeaders
                | Error::UnsupportedVersion
                | Error::IncompleteResponse
                | Error::BadContentLengthHeader
        )
    }

    /// The HTTP status, if this is an HTTP-level failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value.kind(), value.to_string())
    }
}

#[cfg(feature = "canned")]
impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        Error::HttpParseFail(value.to_string())
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(k, v) => write!(f, "io error ({:?}): {}", k, v),
            Error::Transport(v) => write!(f, "transport failure: {}", v),
            Error::Conversion(v) => write!(f, "body conversion failed: {}", v),
            Error::Canceled => write!(f, "call canceled"),
            Error::AlreadyExecuted => write!(f, "call already executed"),
            Error::Http(s) => write!(
                f,
                "HTTP {} {}",
                s.as_str(),
                s.canonical_reason().unwrap_or("Unknown")
            ),
            Error::BadSuccessStatus(s) => {
                write!(f, "success response with non-2xx status: {}", s)
            }
            Error::BadErrorStatus(s) => write!(f, "error response with 2xx status: {}", s),
            Error::UnsupportedReturnType(v) => write!(f, "unsupported return type: {}", v),
            Error::BadReturnType(v) => write!(f, "malformed return type: {}", v),
            Error::WorkerUnavailable(v) => write!(f, "scheduler worker unavailable: {}", v),
            Error::HttpParseFail(v) => write!(f, "http parse fail: {}", v),
            Error::HttpParseTooManyHeaders => write!(f, "http parse resulted in too many headers"),
            Error::UnsupportedVersion => write!(f, "unsupported http version"),
            Error::IncompleteResponse => write!(f, "recorded response is incomplete"),
            Error::BadContentLengthHeader => write!(f, "content-length header not a number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_shows_status_and_reason() {
        let err = Error::Http(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn http_error_with_unknown_reason() {
        let err = Error::Http(StatusCode::from_u16(599).unwrap());
        assert_eq!(err.to_string(), "HTTP 599 Unknown");
    }

    #[test]
    fn http_error_is_not_transport() {
        assert!(!Error::Http(StatusCode::INTERNAL_SERVER_ERROR).is_transport());
        assert!(!Error::UnsupportedReturnType("Foo".into()).is_transport());
        assert!(!Error::AlreadyExecuted.is_transport());
    }

    #[test]
    fn transport_classification() {
        assert!(Error::Transport("reset".into()).is_transport());
        assert!(Error::Conversion("not utf-8".into()).is_transport());
        assert!(Error::Canceled.is_transport());
        assert!(Error::IncompleteResponse.is_transport());
        assert_eq!(Error::Canceled.status(), None);
    }

    #[test]
    fn from_io_error() {
        let io = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(io::ErrorKind::ConnectionReset, _)));
        assert!(err.is_transport());
        assert!(err.to_string().contains("peer went away"));
    }

    #[cfg(feature = "canned")]
    #[test]
    fn from_httparse_error() {
        let httparse_error = httparse::Error::HeaderName;
        let error: Error = httparse_error.into();
        let Error::HttpParseFail(_) = error else {
            panic!("Not Error::HttpParseFail");
        };
    }
}
