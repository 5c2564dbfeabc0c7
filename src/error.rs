//! Error taxonomy and the result codes of the IrApi call
//! surface.
//!
//! Every fallible operation returns [`Result`]. Each
//! [`Error`] maps onto exactly one [`ResultCode`], so
//! callers that only care about the category can match on
//! [`Error::code`].
use std::{fmt, io, path::PathBuf};

use serde_derive::*;
use thiserror::Error;

use crate::registry::ImageId;

/// Sections of a container that may be requested but are
/// optional in the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    VisualImage,
    ThermalImage,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::VisualImage => "visual image",
            Component::ThermalImage => "thermal image",
        })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown image id {0}")]
    InvalidId(ImageId),

    #[error("buffer too small: {required} units required, {available} available")]
    BufferTooSmall { required: usize, available: usize },

    #[error("{0} not present in image")]
    ComponentMissing(Component),

    #[error("i/o failed on {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed BMT container: {0}")]
    Format(String),

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("encoding {0} failed: {1}")]
    Encoding(&'static str, String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn file_io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub(crate) fn format<S: Into<String>>(message: S) -> Self {
        Error::Format(message.into())
    }

    /// The IrApi result code this error is reported as.
    pub fn code(&self) -> ResultCode {
        match self {
            Error::InvalidArgument(_) => ResultCode::InvalidArgument,
            Error::InvalidId(_) => ResultCode::InvalidId,
            Error::BufferTooSmall { .. } => ResultCode::StringAllocationFailed,
            Error::ComponentMissing(_) => ResultCode::ComponentMissing,
            Error::FileIo { .. } => ResultCode::FileIoError,
            Error::Format(_) | Error::Encoding(..) => ResultCode::GenericError,
            Error::NotImplemented(_) => ResultCode::NotImplemented,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Format(e.to_string())
    }
}

/// Categorical outcome of an operation, numbered like the
/// `TESTO_IRAPI_RESULT` enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResultCode {
    Ok = 0,
    InvalidArgument,
    InvalidId,
    StringAllocationFailed,
    ComponentMissing,
    FileIoError,
    GenericError,
    NotImplemented,
}

impl ResultCode {
    pub const ALL: [ResultCode; 8] = [
        ResultCode::Ok,
        ResultCode::InvalidArgument,
        ResultCode::InvalidId,
        ResultCode::StringAllocationFailed,
        ResultCode::ComponentMissing,
        ResultCode::FileIoError,
        ResultCode::GenericError,
        ResultCode::NotImplemented,
    ];

    pub fn description(self) -> &'static str {
        match self {
            ResultCode::Ok => "call succeeded",
            ResultCode::InvalidArgument => "invalid argument",
            ResultCode::InvalidId => "invalid object id",
            ResultCode::StringAllocationFailed => "string allocation failed",
            ResultCode::ComponentMissing => "component not found in image",
            ResultCode::FileIoError => "file i/o failed",
            ResultCode::GenericError => "generic error",
            ResultCode::NotImplemented => "function not implemented",
        }
    }

    /// Collapse a result into its code.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ResultCode::Ok,
            Err(e) => e.code(),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
