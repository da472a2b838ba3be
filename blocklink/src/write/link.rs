//! Links: pending cross-references between written blocks.
//!
//! A link connects two [`Hook`]s; the value eventually stored at the link
//! site is `resolve(to) - resolve(from)`. While writing, links are only
//! recorded as reservations; the linker patches them once every block's
//! position is known.

/// Which edge of the target block a hook resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    /// The first byte of the block.
    Begin,
    /// One past the last byte of the block.
    End,
    /// The position just past the block's last child.
    EndOfChildren,
}

/// How a hook names its block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A fully qualified symbol (`a::b::c`), looked up directly without
    /// any scope search.
    Absolute(String),
    /// A bare id, resolved through the scope order: same namespace, then
    /// child namespace of the current block, then globally.
    Named(String),
}

/// One endpoint of a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hook {
    pub target: Target,
    pub relation: Relation,
    /// Constant added to the resolved address.
    pub offset: i32,
}

impl Hook {
    /// Hook onto the beginning of the named block.
    pub fn begin(id: &str) -> Self {
        Hook {
            target: Target::Named(id.to_string()),
            relation: Relation::Begin,
            offset: 0,
        }
    }

    /// Hook onto the end of the named block.
    pub fn end(id: &str) -> Self {
        Hook {
            target: Target::Named(id.to_string()),
            relation: Relation::End,
            offset: 0,
        }
    }

    /// Hook onto the position just past the named block's children.
    pub fn end_of_children(id: &str) -> Self {
        Hook {
            target: Target::Named(id.to_string()),
            relation: Relation::EndOfChildren,
            offset: 0,
        }
    }

    /// Hook onto a fully qualified symbol, bypassing scope search.
    pub fn absolute(path: &str, relation: Relation) -> Self {
        Hook {
            target: Target::Absolute(path.to_string()),
            relation,
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }
}

/// A pending cross-reference between two hooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub from: Hook,
    pub to: Hook,
}

impl Link {
    pub fn new(from: Hook, to: Hook) -> Self {
        Link { from, to }
    }
}

/// A link reservation recorded by the writer, consumed by the linker's
/// resolve pass.
#[derive(Clone, Debug)]
pub struct ReferenceEntry {
    /// Address of the reserved slot in the writer stream.
    pub addr: u32,
    /// Width in bytes of the reserved slot.
    pub width: u32,
    pub link: Link,
    /// Namespace of the block that was being written.
    pub namespace: String,
    /// Id of the block that was being written, for child-scope lookup.
    pub block_name: String,
}
