//! The node tree: user-supplied blocks the linker lays out.

use crate::error::Result;

use super::writer::Writer;

/// Layout constraints a node places on the linker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "generic-serialization", derive(serde_derive::Serialize))]
pub struct LinkingRestriction {
    /// Pad the stream to this alignment (a power of two) before emitting
    /// the node. `0` means no padding.
    pub alignment: u32,
    /// The node must not be reordered by the shuffle phase.
    pub is_static: bool,
    /// The node has no children; no end-of-children anchor is emitted.
    pub leaf: bool,
}

impl LinkingRestriction {
    pub fn leaf() -> Self {
        LinkingRestriction {
            leaf: true,
            ..LinkingRestriction::default()
        }
    }

    pub fn aligned(alignment: u32) -> Self {
        LinkingRestriction {
            alignment,
            ..LinkingRestriction::default()
        }
    }

    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A writable block in the output tree.
///
/// Nodes are identified by an id unique within their namespace; a node's
/// namespace is the `::`-joined path of its ancestors' ids. The linker
/// takes ownership of the root and produces children on demand during the
/// gather phase.
pub trait Node {
    fn id(&self) -> &str;

    fn restriction(&self) -> LinkingRestriction {
        LinkingRestriction::default()
    }

    /// Children in layout order. Only called once, during gather.
    fn children(&mut self) -> Result<Vec<Box<dyn Node>>> {
        Ok(Vec::new())
    }

    /// Emit this node's bytes. Links are recorded through
    /// [`Writer::write_link`] and patched later by the linker.
    fn write(&self, writer: &mut Writer) -> Result<()>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn restriction_builders() {
        let r = LinkingRestriction::leaf();
        assert!(r.leaf && !r.is_static);
        assert_eq!(r.alignment, 0);

        let r = LinkingRestriction::aligned(16).pinned();
        assert_eq!(r.alignment, 16);
        assert!(r.is_static && !r.leaf);

        let r = LinkingRestriction::leaf().with_alignment(4);
        assert!(r.leaf);
        assert_eq!(r.alignment, 4);
    }
}
