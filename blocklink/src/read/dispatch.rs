//! Indirect reads: offset-chain descriptors, the dispatch stack and the
//! handler invocation machinery.
//!
//! A dispatch chases zero or more offset fields before handing a region to
//! a named handler. Each hop of the chase is described by an
//! [`Indirection`] link; the built-in [`DIRECT`] descriptor performs no
//! chase at all and invokes the handler in place.

use crate::diag::Frame;
use crate::error::{Error, Result};

use super::cursor::Whence;
use super::reader::Reader;

/// Hard cap on dispatch nesting. Exceeding it is a programmer error in the
/// handler tree and fails the read.
pub const MAX_DISPATCH_DEPTH: usize = 16;

/// Width and signedness of an offset field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetWidth {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
}

impl OffsetWidth {
    pub fn width(self) -> u32 {
        match self {
            OffsetWidth::I8 | OffsetWidth::U8 => 1,
            OffsetWidth::I16 | OffsetWidth::U16 => 2,
            OffsetWidth::I32 | OffsetWidth::U32 => 4,
        }
    }
}

/// One link in an offset chase.
///
/// When `pointed`, an offset field of `offset_width` is read at the current
/// position; otherwise the current position itself is the target. The
/// offset (plus the constant `translation`) is then applied through
/// `whence`, and the chase continues with `next` until a terminal link
/// hands over to the handler.
///
/// Descriptors are plain constants; chains link through `'static`
/// references:
///
/// ```
/// use blocklink::read::{Indirection, OffsetWidth};
/// use blocklink::Whence;
///
/// // a u32 absolute offset whose target holds a second, relative offset
/// static INNER: Indirection = Indirection::pointer(OffsetWidth::I16, Whence::Current, 0);
/// static OUTER: Indirection =
///     Indirection::pointer(OffsetWidth::U32, Whence::Set, 0).then(&INNER);
/// # let _ = &OUTER;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Indirection {
    pub pointed: bool,
    pub offset_width: OffsetWidth,
    pub whence: Whence,
    pub translation: i32,
    pub next: Option<&'static Indirection>,
}

impl Indirection {
    /// A link that reads an offset field and follows it.
    pub const fn pointer(offset_width: OffsetWidth, whence: Whence, translation: i32) -> Self {
        Indirection {
            pointed: true,
            offset_width,
            whence,
            translation,
            next: None,
        }
    }

    /// Continue the chase at `next` once this link has been applied.
    pub const fn then(self, next: &'static Indirection) -> Self {
        Indirection {
            next: Some(next),
            ..self
        }
    }
}

/// No indirection: the handler runs at the current position.
pub const DIRECT: Indirection = Indirection {
    pointed: false,
    offset_width: OffsetWidth::U32,
    whence: Whence::Current,
    translation: 0,
    next: None,
};

/// A named, stateless read handler.
///
/// Handlers receive the reader positioned at the start of their region and
/// may read, recurse through `dispatch`, and mutate the context. Under a
/// seek-back dispatch they may leave the cursor anywhere.
pub trait Handler<C> {
    const NAME: &'static str;

    fn on_read(reader: &mut Reader<'_>, ctx: &mut C) -> Result<()>;
}

/// Bounded LIFO of in-flight dispatch frames, consulted by the warning
/// path to name the chain of jumps that led to the current read.
#[derive(Debug, Default)]
pub(super) struct DispatchStack {
    frames: Vec<Frame>,
}

impl DispatchStack {
    pub(super) fn new() -> Self {
        DispatchStack { frames: Vec::new() }
    }

    pub(super) fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub(super) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push a frame for a handler or region starting at `start`.
    ///
    /// The jump site belongs to the parent frame while the new frame is
    /// live: the parent's `jump`/`jump_sz` are pointed at the offset field
    /// that led here, and their previous values are returned so `exit` can
    /// restore them.
    pub(super) fn enter(
        &mut self,
        name: &'static str,
        start: u32,
        parent_jump: u32,
        parent_jump_sz: u32,
    ) -> Result<Option<(u32, u32)>> {
        if self.frames.len() >= MAX_DISPATCH_DEPTH {
            return Err(Error::DispatchStackOverflow);
        }
        self.frames.push(Frame {
            jump: start,
            jump_sz: 1,
            handler_name: name,
            handler_start: start,
        });
        let depth = self.frames.len();
        if depth > 1 {
            let parent = &mut self.frames[depth - 2];
            let saved = (parent.jump, parent.jump_sz);
            parent.jump = parent_jump;
            parent.jump_sz = parent_jump_sz;
            Ok(Some(saved))
        } else {
            Ok(None)
        }
    }

    /// Pop the top frame and give the parent its jump site back.
    pub(super) fn exit(&mut self, saved: Option<(u32, u32)>) {
        self.frames.pop();
        if let (Some((jump, jump_sz)), Some(parent)) = (saved, self.frames.last_mut()) {
            parent.jump = jump;
            parent.jump_sz = jump_sz;
        }
    }
}

impl<'a> Reader<'a> {
    /// Current dispatch nesting depth.
    pub fn dispatch_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Invoke `H` directly at the current position.
    pub fn dispatch<H, C>(&mut self, ctx: &mut C) -> Result<()>
    where
        H: Handler<C>,
    {
        self.invoke::<H, C>(&DIRECT, 0, true, ctx)
    }

    /// Chase the offset chain described by `chain`, then invoke `H` at the
    /// terminal position. `pool` is the runtime base for `Whence::At`
    /// links. On return the cursor is restored to just after the outermost
    /// offset field.
    pub fn dispatch_indirect<H, C>(
        &mut self,
        chain: &Indirection,
        pool: u32,
        ctx: &mut C,
    ) -> Result<()>
    where
        H: Handler<C>,
    {
        self.invoke::<H, C>(chain, pool, true, ctx)
    }

    fn invoke<H, C>(
        &mut self,
        link: &Indirection,
        pool: u32,
        seek_back: bool,
        ctx: &mut C,
    ) -> Result<()>
    where
        H: Handler<C>,
    {
        let start = self.tell();
        let entry_width = if link.pointed {
            link.offset_width.width()
        } else {
            0
        };
        let offset = if link.pointed {
            self.read_offset(link.offset_width)?
        } else {
            0
        };
        let back = self.tell();

        let result = self.chase::<H, C>(link, offset, pool, ctx, start, entry_width);
        if seek_back {
            self.cursor.seek_set(back);
        }
        result
    }

    fn chase<H, C>(
        &mut self,
        link: &Indirection,
        offset: i64,
        pool: u32,
        ctx: &mut C,
        start: u32,
        entry_width: u32,
    ) -> Result<()>
    where
        H: Handler<C>,
    {
        self.seek(link.whence, offset + link.translation as i64, pool)?;
        match link.next {
            // Inner links never seek back; only the outermost layer
            // restores the cursor.
            Some(next) => self.invoke::<H, C>(next, 0, false, ctx),
            None => {
                let here = self.tell();
                let saved = self.stack.enter(H::NAME, here, start, entry_width)?;
                let result = H::on_read(self, ctx);
                self.stack.exit(saved);
                result
            }
        }
    }

    fn read_offset(&mut self, width: OffsetWidth) -> Result<i64> {
        Ok(match width {
            OffsetWidth::I8 => self.read::<i8>()? as i64,
            OffsetWidth::U8 => self.read::<u8>()? as i64,
            OffsetWidth::I16 => self.read::<i16>()? as i64,
            OffsetWidth::U16 => self.read::<u16>()? as i64,
            OffsetWidth::I32 => self.read::<i32>()? as i64,
            OffsetWidth::U32 => self.read::<u32>()? as i64,
        })
    }
}
