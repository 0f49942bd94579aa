/*!
The [`Error`] type returned by wrapping, emitting and setup.
*/

use std::{error, fmt};

/**
The category of an [`Error`].

Callers can match on the kind to tell which piece of configuration is missing, or whether a failure was transient.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /**
    The origin identifier was empty.
    */
    MissingOrigin,
    /**
    The deployment name was empty.
    */
    MissingDeployment,
    /**
    The job name was empty.
    */
    MissingJob,
    /**
    The job index was empty.
    */
    MissingIndex,
    /**
    The value has no envelope representation.
    */
    UnknownEventType,
    /**
    The emitter has already been closed.
    */
    Closed,
    /**
    Address resolution, dialing or writing failed.
    */
    Network,
    /**
    The system clock could not produce a unix timestamp.
    */
    Clock,
    /**
    A configuration value could not be used.
    */
    Config,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingOrigin => "event not emitted due to missing origin information",
            ErrorKind::MissingDeployment => {
                "event not emitted due to missing deployment information"
            }
            ErrorKind::MissingJob => "event not emitted due to missing job information",
            ErrorKind::MissingIndex => "event not emitted due to missing job index information",
            ErrorKind::UnknownEventType => "cannot create envelope for unknown event type",
            ErrorKind::Closed => "use of closed emitter",
            ErrorKind::Network => "network failure",
            ErrorKind::Clock => "system clock is before the unix epoch",
            ErrorKind::Config => "invalid configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/**
An error wrapping, marshalling or transmitting an event.
*/
pub struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Error { kind, source: None }
    }

    pub(crate) fn with_source(
        kind: ErrorKind,
        source: impl Into<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error {
            kind,
            source: Some(source.into()),
        }
    }

    pub(crate) fn network(source: impl Into<Box<dyn error::Error + Send + Sync>>) -> Self {
        Error::with_source(ErrorKind::Network, source)
    }

    pub(crate) fn closed() -> Self {
        Error::new(ErrorKind::Closed)
    }

    /**
    The category of this error.
    */
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /**
    Construct an error with a custom message.

    This is useful for [`crate::Emitter`] implementations outside of this crate.
    */
    pub fn msg(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Error::with_source(kind, msg.into())
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("Error");

        f.field("kind", &self.kind);

        if let Some(ref source) = self.source {
            f.field("source", source);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(ref source) => write!(f, "{}: {}", self.kind, source),
            None => fmt::Display::fmt(&self.kind, f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn error::Error + 'static))
    }
}
