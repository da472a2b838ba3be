//! Two-pass layout of a node tree.
//!
//! The linker flattens the tree into an ordered layout (gather), emits
//! every block while building a namespaced symbol map (write), then patches
//! all link reservations recorded by the writer (resolve). Symbols follow
//! the `a::b::c` syntax; every non-leaf node additionally owns an
//! `a::b::EndOfChildren` anchor marking the position just past its last
//! child.

use log::{debug, warn};

use crate::error::Result;

use super::link::{Hook, Relation, Target};
use super::node::{LinkingRestriction, Node};
use super::writer::Writer;

/// Id of the synthetic anchor appended after a node's children.
pub const END_OF_CHILDREN_ID: &str = "EndOfChildren";

struct EndOfChildrenMarker;

impl Node for EndOfChildrenMarker {
    fn id(&self) -> &str {
        END_OF_CHILDREN_ID
    }

    fn restriction(&self) -> LinkingRestriction {
        LinkingRestriction::leaf()
    }

    fn write(&self, _writer: &mut Writer) -> Result<()> {
        Ok(())
    }
}

fn join(namespace: &str, id: &str) -> String {
    if namespace.is_empty() {
        id.to_string()
    } else {
        format!("{}::{}", namespace, id)
    }
}

/// One gathered node, paired with the namespace of its parent.
pub struct LayoutEntry {
    namespace: String,
    node: Box<dyn Node>,
}

impl LayoutEntry {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> &str {
        self.node.id()
    }

    /// The entry's unique symbol, `namespace::id`.
    pub fn symbol(&self) -> String {
        join(&self.namespace, self.node.id())
    }
}

/// A written region of the stream, keyed by symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "generic-serialization", derive(serde_derive::Serialize))]
pub struct SymbolMapEntry {
    pub symbol: String,
    pub begin: u32,
    pub end: u32,
    pub restriction: LinkingRestriction,
}

/// The two-pass linker. Owns the gathered layout and the symbol map built
/// during the write pass.
#[derive(Default)]
pub struct Linker {
    layout: Vec<LayoutEntry>,
    map: Vec<SymbolMapEntry>,
}

impl Linker {
    pub fn new() -> Self {
        Linker::default()
    }

    pub fn layout(&self) -> &[LayoutEntry] {
        &self.layout
    }

    /// Symbol map built by [`write`](Linker::write), in layout order.
    pub fn symbol_map(&self) -> &[SymbolMapEntry] {
        &self.map
    }

    /// Flatten the tree under `root` into the layout, pre-order. Children
    /// land in the namespace `parent_namespace::parent_id`; each non-leaf
    /// node is followed by its end-of-children anchor in that same
    /// namespace.
    pub fn gather(&mut self, root: Box<dyn Node>, namespace: &str) -> Result<()> {
        self.gather_into(root, namespace.to_string())
    }

    fn gather_into(&mut self, mut node: Box<dyn Node>, namespace: String) -> Result<()> {
        let children = node.children()?;
        let restriction = node.restriction();
        let child_namespace = join(&namespace, node.id());
        self.layout.push(LayoutEntry { namespace, node });

        for child in children {
            self.gather_into(child, child_namespace.clone())?;
        }

        if !restriction.leaf {
            self.layout.push(LayoutEntry {
                namespace: child_namespace,
                node: Box::new(EndOfChildrenMarker),
            });
        }
        Ok(())
    }

    /// Optional reordering hook run before the write pass. Reordering is
    /// currently not performed: the gathered order is preserved, which
    /// trivially respects every `is_static` restriction.
    pub fn shuffle(&mut self) {}

    /// Emit every layout entry and build the symbol map.
    pub fn write(&mut self, writer: &mut Writer) -> Result<()> {
        for entry in &self.layout {
            let restriction = entry.node.restriction();
            writer.align(restriction.alignment);
            let begin = writer.tell();
            writer.namespace = entry.namespace.clone();
            writer.block_name = entry.node.id().to_string();
            entry.node.write(writer)?;
            self.map.push(SymbolMapEntry {
                symbol: entry.symbol(),
                begin,
                end: writer.tell(),
                restriction,
            });
        }
        self.log_symbol_map();
        Ok(())
    }

    fn log_symbol_map(&self) {
        debug!("begin    end      size     align    static leaf  symbol");
        for entry in &self.map {
            debug!(
                "{:08x} {:08x} {:08x} {:08x} {:<6} {:<5} {}",
                entry.begin,
                entry.end,
                entry.end - entry.begin,
                entry.restriction.alignment,
                entry.restriction.is_static,
                entry.restriction.leaf,
                entry.symbol
            );
        }
    }

    /// Patch every link reservation recorded by the writer. Unresolvable
    /// hooks are warned about and leave the sentinel bytes in place.
    pub fn resolve(&mut self, writer: &mut Writer) -> Result<()> {
        let reservations = writer.take_reservations();
        for reserve in &reservations {
            let from = self.hook_symbol(&reserve.link.from, &reserve.namespace, &reserve.block_name);
            let to = self.hook_symbol(&reserve.link.to, &reserve.namespace, &reserve.block_name);
            let (from, to) = match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => continue,
            };
            let from_addr = self.hook_addr(&from, reserve.link.from.relation, reserve.link.from.offset);
            let to_addr = self.hook_addr(&to, reserve.link.to.relation, reserve.link.to.offset);
            if let (Some(from_addr), Some(to_addr)) = (from_addr, to_addr) {
                writer.seek_set(reserve.addr);
                writer.write_n(reserve.width, to_addr.wrapping_sub(from_addr));
            }
        }
        Ok(())
    }

    /// Gather, shuffle, write and resolve in one call, with the root in
    /// the empty namespace.
    pub fn link(&mut self, root: Box<dyn Node>, writer: &mut Writer) -> Result<()> {
        self.gather(root, "")?;
        self.shuffle();
        self.write(writer)?;
        self.resolve(writer)
    }

    /// Turn a hook into the full symbol of its block, or warn and yield
    /// `None`.
    fn hook_symbol(&self, hook: &Hook, namespace: &str, block_name: &str) -> Option<String> {
        let resolved = match &hook.target {
            Target::Absolute(path) => {
                if self.layout.iter().any(|e| e.symbol() == *path) {
                    Some(path.clone())
                } else {
                    None
                }
            }
            Target::Named(name) => self.find_namespaced(name, namespace, block_name),
        };
        if resolved.is_none() {
            let shown = match &hook.target {
                Target::Absolute(path) => path,
                Target::Named(name) => name,
            };
            warn!("cannot resolve link target \"{}\"", shown);
        }
        resolved
    }

    /// Scope-ordered lookup of a bare id: same namespace, then the child
    /// namespace of the current block, then the first layout entry of that
    /// id anywhere. Within a scope, the first-gathered entry wins.
    fn find_namespaced(&self, name: &str, namespace: &str, block_name: &str) -> Option<String> {
        let local = join(namespace, name);
        if self.layout.iter().any(|e| e.symbol() == local) {
            return Some(local);
        }
        let child = join(&join(namespace, block_name), name);
        if self.layout.iter().any(|e| e.symbol() == child) {
            return Some(child);
        }
        self.layout
            .iter()
            .find(|e| e.node.id() == name)
            .map(|e| e.symbol())
    }

    /// Address a resolved symbol according to the hook relation: `begin`
    /// for `Begin` and `EndOfChildren` (the anchor's own begin), `end` for
    /// `End`, plus the hook's constant offset.
    fn hook_addr(&self, symbol: &str, relation: Relation, offset: i32) -> Option<u32> {
        let mut symbol = symbol.to_string();
        if relation == Relation::EndOfChildren {
            if !symbol.is_empty() {
                symbol.push_str("::");
            }
            symbol.push_str(END_OF_CHILDREN_ID);
        }
        let entry = match self.map.iter().find(|e| e.symbol == symbol) {
            Some(entry) => entry,
            None => {
                warn!("cannot resolve symbol \"{}\"", symbol);
                return None;
            }
        };
        let base = match relation {
            Relation::Begin | Relation::EndOfChildren => entry.begin,
            Relation::End => entry.end,
        };
        Some(base.wrapping_add(offset as u32))
    }
}
