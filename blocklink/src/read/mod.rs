//! The read path: cursor, typed reader and the indirection engine.

mod cursor;
mod dispatch;
mod reader;

pub use self::cursor::{Cursor, Whence};
pub use self::dispatch::{Handler, Indirection, OffsetWidth, DIRECT, MAX_DISPATCH_DEPTH};
pub use self::reader::{Reader, ReaderOptions};
