use std::borrow::Cow;

use hpi_wire::Status;
use hpi_wire::error::{DecodeError, DescriptorError, EncodeError};
use hpi_wire::frame::FrameError;

use tracing::error;

/// All possible error kinds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorKind {
    /// Errors encountered while building the call registry.
    Registry,
    /// Errors of the underlying stream, timeouts included.
    Transport,
    /// The operation is not part of the call registry.
    UnknownOperation,
    /// Errors encountered while encoding a request.
    Encode,
    /// Errors encountered while decoding a reply.
    Decode,
    /// The server answered with an error frame.
    Rejected,
    /// The server answered with a failure status.
    Status,
}

impl ErrorKind {
    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::Registry => "Registry",
            Self::Transport => "Transport",
            Self::UnknownOperation => "Unknown Operation",
            Self::Encode => "Encode",
            Self::Decode => "Decode",
            Self::Rejected => "Rejected",
            Self::Status => "Status",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.description().fmt(f)
    }
}

/// Client error.
#[derive(PartialEq)]
pub struct Error {
    kind: ErrorKind,
    description: Cow<'static, str>,
    status: Option<Status>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.format(f)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.format(f)
    }
}

impl Error {
    /// Creates an [`Error`] from an [`ErrorKind`] and a description.
    #[inline]
    pub fn new(kind: ErrorKind, description: impl Into<Cow<'static, str>>) -> Self {
        let description = description.into();
        error!("{}", description.as_ref());
        Self {
            kind,
            description,
            status: None,
        }
    }

    pub(crate) fn status_failure(operation: &str, status: Status) -> Self {
        let mut error = Self::new(ErrorKind::Status, format!("{operation} failed with {status}"));
        error.status = Some(status);
        error
    }

    /// Returns the [`ErrorKind`].
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the failure status sent by the server, if any.
    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        self.status
    }

    fn format(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Transport, e.to_string())
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::new(ErrorKind::Transport, e.to_string())
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::new(ErrorKind::Encode, e.to_string())
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::new(ErrorKind::Decode, e.to_string())
    }
}

impl From<DescriptorError> for Error {
    fn from(e: DescriptorError) -> Self {
        Self::new(ErrorKind::Registry, e.to_string())
    }
}

impl std::error::Error for Error {}

/// A specialized [`Result`] type for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use hpi_wire::Status;

    use super::{Error, ErrorKind};

    #[test]
    fn client_error() {
        let error = Error::new(ErrorKind::Rejected, "Error frame for operation 4.");
        assert_eq!(error.to_string(), "Rejected: Error frame for operation 4.");
        assert_eq!(error.status(), None);

        let error = Error::status_failure("SessionClose", Status::INVALID_SESSION);
        assert_eq!(error.kind(), ErrorKind::Status);
        assert_eq!(error.status(), Some(Status::INVALID_SESSION));
    }
}
