//! The write path: vector-backed writer, node tree and two-pass linker.

mod link;
mod linker;
mod node;
mod writer;

pub use self::link::{Hook, Link, ReferenceEntry, Relation, Target};
pub use self::linker::{LayoutEntry, Linker, SymbolMapEntry, END_OF_CHILDREN_ID};
pub use self::node::{LinkingRestriction, Node};
pub use self::writer::{Writer, LINK_SENTINEL};
