//! # Block stream reading, writing and linking
//!
//! [`Reader`]: ./read/struct.Reader.html
//! [`Handler`]: ./read/trait.Handler.html
//! [`Indirection`]: ./read/struct.Indirection.html
//! [`Writer`]: ./write/struct.Writer.html
//! [`Node`]: ./write/trait.Node.html
//! [`Linker`]: ./write/struct.Linker.html
//!
//! `blocklink` is a small framework for binary file formats of the
//! "magic + header + nested block table with offsets" family: formats
//! whose layout cross-references itself through internal offset fields.
//!
//! ## Reading: [`Reader`]
//!
//! The reader borrows a byte buffer and offers endian-aware typed reads,
//! magic and byte-order-mark expectations, and rich range diagnostics.
//! Offset fields are chased declaratively: an [`Indirection`] descriptor
//! states how to reach a region (read a 32-bit absolute offset here,
//! follow it, then a 16-bit relative one, ...) and `dispatch` hands the
//! region to a named [`Handler`]. While handlers run, a bounded dispatch
//! stack remembers the chain of jumps, so a malformed file is reported
//! with the offset field responsible for the bad region, not just the
//! position of the failed read.
//!
//! ```
//! use blocklink::Reader;
//!
//! let data = [0x00, 0x00, 0x00, 0x2a];
//! let mut reader = Reader::new(&data); // big-endian until told otherwise
//! assert_eq!(reader.read::<u32>().unwrap(), 42);
//! ```
//!
//! ## Writing and linking: [`Writer`], [`Node`], [`Linker`]
//!
//! The write path inverts the arrangement: blocks are [`Node`]s in a tree,
//! each emitting bytes into a growable [`Writer`]. A block that needs to
//! store an offset to another block writes a *link* instead: a reserved
//! slot described by a pair of hooks. The [`Linker`] flattens the tree,
//! writes every block while recording where each one landed in a
//! namespaced symbol map, then patches every reserved slot with the
//! resolved relative offset.
//!
//! ```
//! use blocklink::{Hook, Linker, LinkingRestriction, Node, Result, Writer};
//!
//! struct Header;
//! impl Node for Header {
//!     fn id(&self) -> &str { "header" }
//!     fn restriction(&self) -> LinkingRestriction { LinkingRestriction::leaf() }
//!     fn write(&self, writer: &mut Writer) -> Result<()> {
//!         writer.write::<u32>(0x424c4b31); // magic
//!         // offset of the payload, relative to this block
//!         writer.write_link_between::<u32>(Hook::begin("header"), Hook::begin("payload"));
//!         Ok(())
//!     }
//! }
//!
//! struct Payload;
//! impl Node for Payload {
//!     fn id(&self) -> &str { "payload" }
//!     fn restriction(&self) -> LinkingRestriction { LinkingRestriction::leaf() }
//!     fn write(&self, writer: &mut Writer) -> Result<()> {
//!         writer.write::<u16>(7);
//!         Ok(())
//!     }
//! }
//!
//! struct Root;
//! impl Node for Root {
//!     fn id(&self) -> &str { "root" }
//!     fn children(&mut self) -> Result<Vec<Box<dyn Node>>> {
//!         Ok(vec![Box::new(Header), Box::new(Payload)])
//!     }
//!     fn write(&self, _writer: &mut Writer) -> Result<()> { Ok(()) }
//! }
//!
//! let mut linker = Linker::new();
//! let mut writer = Writer::new();
//! linker.link(Box::new(Root), &mut writer).unwrap();
//! let bytes = writer.into_vec();
//! // the patched link holds payload.begin - header.begin = 8
//! assert_eq!(&bytes[4..8], &[0, 0, 0, 8]);
//! ```
//!
//! Reading and writing share the endian machinery: both sides default to
//! big-endian, honour per-instance `set_endian`/`switch_endian`, and
//! accept a per-operation override.

pub mod diag;
pub mod endian;
mod error;
mod macros;
pub mod read;
pub mod write;

pub use crate::diag::{Frame, Invalidity, LogSink, MemorySink, Warning, WarningSink};
pub use crate::endian::{EndianSelect, Scalar, HOST_BIG_ENDIAN};
pub use crate::error::{Error, Result};
pub use crate::read::{Handler, Indirection, OffsetWidth, Reader, ReaderOptions, Whence, DIRECT};
pub use crate::write::{
    Hook, Link, LinkingRestriction, Linker, Node, Relation, Target, Writer, LINK_SENTINEL,
};
