use std::{fmt, io, num::TryFromIntError};
use png::DecodingError;

/// Broad category of an [`Error`]. Callers branch on this to decide whether to
/// abort or render a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration needed before a map can exist.
    Configuration,
    /// A named bundle resource does not exist.
    ResourceNotFound,
    /// A bundle resource exists but could not be read or decoded.
    ResourceLoad,
    /// A style mutation was rejected.
    Style,
    /// Rasterizing or writing the map image failed.
    Render,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::ResourceLoad => "resource load error",
            ErrorKind::Style => "style error",
            ErrorKind::Render => "render error",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Configuration, message)
    }

    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::ResourceNotFound, message)
    }

    pub fn resource_load(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::ResourceLoad, message)
    }

    pub fn style(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Style, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Render, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        let kind = if value.kind() == io::ErrorKind::NotFound {
            ErrorKind::ResourceNotFound
        } else {
            ErrorKind::ResourceLoad
        };
        Error {
            kind,
            message: value.to_string()
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::ResourceLoad,
            message: value.to_string()
        }
    }
}

impl From<geojson::Error> for Error {
    fn from(value: geojson::Error) -> Self {
        Error {
            kind: ErrorKind::ResourceLoad,
            message: value.to_string()
        }
    }
}

impl From<DecodingError> for Error {
    fn from(value: DecodingError) -> Self {
        Error {
            kind: ErrorKind::ResourceLoad,
            message: value.to_string()
        }
    }
}

impl From<TryFromIntError> for Error {
    fn from(value: TryFromIntError) -> Self {
        Error {
            kind: ErrorKind::ResourceLoad,
            message: value.to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
