//! Read-path diagnostics: invalidity classification, dispatch stack
//! frames, and the warning sink the reader reports through.
//!
//! Warnings are not errors: except where §fatal policy says otherwise the
//! read continues, and the caller decides what to do with the report. Every
//! warning carries the stream range it refers to and a snapshot of the
//! dispatch stack so the responsible jump site can be named.

use std::fmt;

use log::warn;

/// Render a 32-bit magic as its four ASCII bytes, most significant first.
/// Non-printable bytes come out as `.`.
pub fn fourcc(value: u32) -> String {
    value
        .to_be_bytes()
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// One in-flight read on the dispatch stack.
///
/// `jump`/`jump_sz` locate the offset field that led into the frame below;
/// `handler_start` is where the handler's region begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "generic-serialization", derive(serde_derive::Serialize))]
pub struct Frame {
    pub jump: u32,
    pub jump_sz: u32,
    pub handler_name: &'static str,
    pub handler_start: u32,
}

/// The closed set of failure classes the reader can diagnose.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "generic-serialization", derive(serde_derive::Serialize))]
pub enum Invalidity {
    /// A 32-bit magic did not match.
    Magic { expected: u32, found: u32 },
    /// A byte-order mark was neither `0xFEFF` nor `0xFFFE`.
    ByteOrderMark { found: u16 },
    /// A scalar was read at an offset not aligned to its width.
    Alignment { at: u32, width: u32 },
    /// A read would have crossed the end of the buffer. Fatal.
    Bounds { at: u32, width: u32, size: u32 },
    /// User-supplied diagnosis of a well-formed but invalid value.
    Uncommon(String),
}

impl fmt::Display for Invalidity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Invalidity::Magic { expected, found } => write!(
                f,
                "unexpected magic: expected '{}' (0x{:08x}), found '{}' (0x{:08x})",
                fourcc(*expected),
                expected,
                fourcc(*found),
                found
            ),
            Invalidity::ByteOrderMark { found } => {
                write!(f, "invalid byte-order mark 0x{:04x}", found)
            }
            Invalidity::Alignment { at, width } => write!(
                f,
                "alignment error: 0x{:x} is not {} byte aligned",
                at, width
            ),
            Invalidity::Bounds { at, width, size } => write!(
                f,
                "out of bounds: reading {} bytes at 0x{:x} but the buffer ends at 0x{:x}",
                width, at, size
            ),
            Invalidity::Uncommon(msg) => write!(f, "{}", msg),
        }
    }
}

/// Where reader warnings go.
///
/// `trace` is the dispatch stack at the moment of the warning, outermost
/// frame first.
pub trait WarningSink {
    fn warn(&mut self, message: &str, begin: u32, end: u32, trace: &[Frame]);
}

impl<'a, S: WarningSink + ?Sized> WarningSink for &'a mut S {
    fn warn(&mut self, message: &str, begin: u32, end: u32, trace: &[Frame]) {
        (**self).warn(message, begin, end, trace)
    }
}

/// The default sink: reports through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl WarningSink for LogSink {
    fn warn(&mut self, message: &str, begin: u32, end: u32, trace: &[Frame]) {
        warn!("{} (bytes 0x{:x}..0x{:x})", message, begin, end);
        for frame in trace {
            warn!(
                "    in {} (block at 0x{:x}, jump site 0x{:x}+{})",
                frame.handler_name, frame.handler_start, frame.jump, frame.jump_sz
            );
        }
    }
}

/// A fully rendered warning, as recorded by [`MemorySink`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "generic-serialization", derive(serde_derive::Serialize))]
pub struct Warning {
    pub message: String,
    pub begin: u32,
    pub end: u32,
    pub trace: Vec<Frame>,
}

/// A sink that keeps every warning, for tests and for callers that want to
/// inspect diagnostics programmatically.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub warnings: Vec<Warning>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl WarningSink for MemorySink {
    fn warn(&mut self, message: &str, begin: u32, end: u32, trace: &[Frame]) {
        self.warnings.push(Warning {
            message: message.to_string(),
            begin,
            end,
            trace: trace.to_vec(),
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fourcc_printable() {
        assert_eq!(fourcc(0x424d4431), "BMD1");
        assert_eq!(fourcc(0x00414243), ".ABC");
    }

    #[test]
    fn magic_invalidity_names_both_sides() {
        let inv = Invalidity::Magic {
            expected: 0x52415721, // RAW!
            found: 0x52415700,
        };
        let msg = inv.to_string();
        assert!(msg.contains("'RAW!'"), "{}", msg);
        assert!(msg.contains("'RAW.'"), "{}", msg);
    }

    #[test]
    fn memory_sink_records_trace() {
        let mut sink = MemorySink::new();
        let trace = [Frame {
            jump: 4,
            jump_sz: 4,
            handler_name: "header",
            handler_start: 16,
        }];
        sink.warn("boom", 16, 20, &trace);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.warnings[0].begin, 16);
        assert_eq!(sink.warnings[0].trace, trace.to_vec());
    }
}
