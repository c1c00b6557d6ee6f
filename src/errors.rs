use crate::StatusCode;
use std::{error, fmt, io};

/// Every failure the engine can report.
///
/// Parse errors map onto an error response through
/// [`status_code`](ErrorKind::status_code); I/O errors end the session.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    InvalidMethod,
    InvalidUri,
    UnsupportedVersion,

    InvalidHeader,
    InvalidEncoding,
    HeaderLineTooLong,
    InvalidContentLength,
    BodyTooLarge,

    HandlerAlreadyExists,
    SourceUnavailable,

    UndefinedAddress,
    NotBound,
    Io(IoError),
}

impl ErrorKind {
    /// Status code of the response sent back when a request fails with `self`.
    #[inline]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedVersion => StatusCode::HttpVersionNotSupported,
            Self::InvalidMethod
            | Self::InvalidUri
            | Self::InvalidHeader
            | Self::InvalidEncoding
            | Self::HeaderLineTooLong
            | Self::InvalidContentLength
            | Self::BodyTooLarge => StatusCode::BadRequest,
            Self::SourceUnavailable => StatusCode::NotFound,
            _ => StatusCode::InternalServerError,
        }
    }
}

impl error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(&err.0),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Io({})", err.0),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

/// [`io::Error`] compared by [kind](io::Error::kind).
#[derive(Debug)]
pub struct IoError(pub io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}
