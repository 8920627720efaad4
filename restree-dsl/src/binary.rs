use std::{
    fmt,
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use bytes::Bytes;

use crate::error::PayloadError;

type SharedReader = Arc<Mutex<Option<Box<dyn Read + Send>>>>;

/**
A binary request body. Exactly one source is active per instance, and
the instance never changes after construction.

A file-backed payload only holds the path; the file is opened by [BinaryRequest::open]
when the request is dispatched, so the reader owns the handle and releases it on drop.
*/
#[derive(Clone)]
pub enum BinaryRequest {
    File(PathBuf),
    Bytes(Bytes),
    /// one-shot reader, shared between builder branches. Whoever opens it first gets it.
    Stream(SharedReader),
}

impl BinaryRequest {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        BinaryRequest::File(path.into())
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        BinaryRequest::Bytes(bytes.into())
    }

    /// Wrap a reader that can be consumed only once. Cloning the payload, or
    /// branching a builder that holds it, shares that single reader: after any
    /// branch dispatches the request, every other branch holding the same
    /// payload fails with [PayloadError::StreamConsumed].
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        BinaryRequest::Stream(Arc::new(Mutex::new(Some(Box::new(reader)))))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, BinaryRequest::File(_))
    }

    /// human readable name of the active variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            BinaryRequest::File(_) => "file",
            BinaryRequest::Bytes(_) => "bytes",
            BinaryRequest::Stream(_) => "stream",
        }
    }

    pub fn as_file(&self) -> Result<&Path, PayloadError> {
        match self {
            BinaryRequest::File(path) => Ok(path.as_path()),
            other => Err(PayloadError::NotAFile {
                actual: other.kind(),
            }),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], PayloadError> {
        match self {
            BinaryRequest::Bytes(bytes) => Ok(bytes.as_ref()),
            other => Err(PayloadError::NotBytes {
                actual: other.kind(),
            }),
        }
    }

    /// Number of bytes this payload will produce, if known without reading it.
    /// Stat'ing a file that doesn't exist yields `None`; the error surfaces on [Self::open].
    pub fn len_hint(&self) -> Option<u64> {
        match self {
            BinaryRequest::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            BinaryRequest::Bytes(bytes) => Some(bytes.len() as u64),
            BinaryRequest::Stream(_) => None,
        }
    }

    /// Obtain a readable source for this payload.
    pub fn open(&self) -> Result<Box<dyn Read + Send>, PayloadError> {
        match self {
            BinaryRequest::File(path) => {
                log::trace!("opening file payload {}", path.display());
                Ok(Box::new(File::open(path)?))
            }
            BinaryRequest::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            BinaryRequest::Stream(shared) => {
                let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                guard.take().ok_or(PayloadError::StreamConsumed)
            }
        }
    }
}

impl fmt::Debug for BinaryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryRequest::File(path) => f.debug_tuple("File").field(path).finish(),
            BinaryRequest::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            BinaryRequest::Stream(shared) => write!(f, "Stream({:p})", Arc::as_ptr(shared)),
        }
    }
}

/// Streams compare by identity, since their content can't be inspected without consuming it.
impl PartialEq for BinaryRequest {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BinaryRequest::File(l), BinaryRequest::File(r)) => l == r,
            (BinaryRequest::Bytes(l), BinaryRequest::Bytes(r)) => l == r,
            (BinaryRequest::Stream(l), BinaryRequest::Stream(r)) => Arc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl From<Vec<u8>> for BinaryRequest {
    fn from(value: Vec<u8>) -> Self {
        BinaryRequest::bytes(value)
    }
}

impl From<&'static [u8]> for BinaryRequest {
    fn from(value: &'static [u8]) -> Self {
        BinaryRequest::bytes(value)
    }
}

impl From<PathBuf> for BinaryRequest {
    fn from(value: PathBuf) -> Self {
        BinaryRequest::File(value)
    }
}
