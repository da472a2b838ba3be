use std::{error, fmt, io, result};

use crate::diag::fourcc;

/// All expected errors while reading, writing or linking a block stream.
#[derive(Debug)]
pub enum Error {
    /// Not enough bytes left in the buffer for the requested read. The
    /// fields are the read position, the width requested and the buffer
    /// size. A reader returning this should be abandoned by the caller.
    UnexpectedEnd { at: u32, wanted: u32, size: u32 },
    /// A seek computed a target outside `0..=size`.
    SeekOutOfBounds { target: i64, size: u32 },
    /// A critical magic expectation failed.
    BadMagic { expected: u32, found: u32 },
    /// More than [`MAX_DISPATCH_DEPTH`](crate::read::MAX_DISPATCH_DEPTH)
    /// nested dispatches; a programmer error in the handler tree.
    DispatchStackOverflow,
    IoError(io::Error),
    /// Failure raised by a user handler or node.
    Custom(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedEnd { at, wanted, size } => write!(
                f,
                "not enough bytes: reading {} bytes at 0x{:x} but the buffer ends at 0x{:x}",
                wanted, at, size
            ),
            Error::SeekOutOfBounds { target, size } => write!(
                f,
                "seek target {} is outside the stream of size 0x{:x}",
                target, size
            ),
            Error::BadMagic { expected, found } => write!(
                f,
                "bad magic: expected '{}' (0x{:08x}), found '{}' (0x{:08x})",
                fourcc(*expected),
                expected,
                fourcc(*found),
                found
            ),
            Error::DispatchStackOverflow => write!(f, "dispatch stack overflow"),
            Error::IoError(_) => write!(f, "I/O error"),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
