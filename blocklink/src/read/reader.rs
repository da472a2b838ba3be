//! Typed reading over a borrowed byte buffer.

use crate::diag::{Invalidity, LogSink, WarningSink};
use crate::endian::{EndianSelect, Scalar};
use crate::error::{Error, Result};

use super::cursor::{Cursor, Whence};
use super::dispatch::DispatchStack;

/// Togglable checks performed on every typed read.
#[derive(Clone, Copy, Debug)]
pub struct ReaderOptions {
    /// Warn when a scalar is read at an offset not aligned to its width.
    pub check_alignment: bool,
    /// Emit the (fatal) bounds warning before failing a read past the end.
    /// The read fails either way; this only controls the diagnostic.
    pub warn_bounds: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            check_alignment: true,
            warn_bounds: true,
        }
    }
}

/// A structured binary reader over a borrowed buffer.
///
/// The reader tracks a cursor, an endian flag (big-endian until told
/// otherwise) and the dispatch stack used to attribute diagnostics to the
/// offset field responsible for the region being read. It never mutates
/// the buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pub(super) cursor: Cursor,
    big_endian: bool,
    name: String,
    options: ReaderOptions,
    pub(super) stack: DispatchStack,
    sink: Box<dyn WarningSink + 'a>,
}

impl<'a> Reader<'a> {
    /// Reader over `buf` reporting warnings through the `log` facade.
    pub fn new(buf: &'a [u8]) -> Self {
        Reader::with_sink(buf, Box::new(LogSink))
    }

    /// Reader over `buf` reporting warnings into the given sink.
    pub fn with_sink(buf: &'a [u8], sink: Box<dyn WarningSink + 'a>) -> Self {
        Reader {
            buf,
            cursor: Cursor::new(buf.len() as u32),
            big_endian: true,
            name: String::new(),
            options: ReaderOptions::default(),
            stack: DispatchStack::new(),
            sink,
        }
    }

    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Label used as a prefix in diagnostics, typically the file name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[inline]
    pub fn tell(&self) -> u32 {
        self.cursor.tell()
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.cursor.size()
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.cursor.remaining()
    }

    #[inline]
    pub fn is_in_bounds(&self, pos: u32) -> bool {
        self.cursor.is_in_bounds(pos)
    }

    pub fn seek_set(&mut self, pos: u32) {
        self.cursor.seek_set(pos)
    }

    pub fn seek(&mut self, whence: Whence, delta: i64, pool: u32) -> Result<()> {
        self.cursor.seek(whence, delta, pool)
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    pub fn set_endian(&mut self, big: bool) {
        self.big_endian = big;
    }

    pub fn switch_endian(&mut self) {
        self.big_endian = !self.big_endian;
    }

    /// Report a warning over the byte range `[begin, end)`, rendering the
    /// dispatch stack into the sink.
    pub fn warn_at(&mut self, message: &str, begin: u32, end: u32) {
        if self.name.is_empty() {
            self.sink.warn(message, begin, end, self.stack.frames());
        } else {
            let message = format!("{}: {}", self.name, message);
            self.sink.warn(&message, begin, end, self.stack.frames());
        }
    }

    fn emit(&mut self, invalidity: Invalidity, begin: u32, end: u32) {
        self.warn_at(&invalidity.to_string(), begin, end)
    }

    /// Warn about the value just read, spanning `[pos - WIDTH, pos)`.
    pub fn signal_invalidity_last<T: Scalar>(&mut self, invalidity: Invalidity) {
        let end = self.tell();
        let begin = end.saturating_sub(T::WIDTH);
        self.emit(invalidity, begin, end);
    }

    fn check_alignment<T: Scalar>(&mut self) {
        let at = self.tell();
        if self.options.check_alignment && T::WIDTH > 1 && at % T::WIDTH != 0 {
            self.emit(
                Invalidity::Alignment { at, width: T::WIDTH },
                at,
                at.saturating_add(T::WIDTH),
            );
        }
    }

    fn check_bounds<T: Scalar>(&mut self, at: u32) -> Result<()> {
        if at as u64 + T::WIDTH as u64 > self.size() as u64 {
            if self.options.warn_bounds {
                self.emit(
                    Invalidity::Bounds {
                        at,
                        width: T::WIDTH,
                        size: self.size(),
                    },
                    at,
                    at.saturating_add(T::WIDTH),
                );
            }
            return Err(Error::UnexpectedEnd {
                at,
                wanted: T::WIDTH,
                size: self.size(),
            });
        }
        Ok(())
    }

    /// Read `T` at the current position without advancing.
    pub fn peek_endian<T: Scalar>(&mut self, endian: EndianSelect) -> Result<T> {
        self.check_alignment::<T>();
        let at = self.tell();
        self.check_bounds::<T>(at)?;
        Ok(T::get(
            &self.buf[at as usize..],
            endian.is_big(self.big_endian),
        ))
    }

    pub fn peek<T: Scalar>(&mut self) -> Result<T> {
        self.peek_endian(EndianSelect::Current)
    }

    /// Read `T` and advance the cursor by its width.
    pub fn read_endian<T: Scalar>(&mut self, endian: EndianSelect) -> Result<T> {
        let value = self.peek_endian::<T>(endian)?;
        self.cursor.seek(Whence::Current, T::WIDTH as i64, 0)?;
        Ok(value)
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        self.read_endian(EndianSelect::Current)
    }

    /// `N` successive reads of `T`, in stream order.
    pub fn read_array<T: Scalar, const N: usize>(&mut self) -> Result<[T; N]> {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = self.read()?;
        }
        Ok(out)
    }

    /// Peek `T` at `pos + translation` without advancing. No alignment
    /// check is performed.
    pub fn peek_at<T: Scalar>(&mut self, translation: i32) -> Result<T> {
        let target = self.tell() as i64 + translation as i64;
        if target < 0 {
            return Err(Error::SeekOutOfBounds {
                target,
                size: self.size(),
            });
        }
        let at = target as u32;
        self.check_bounds::<T>(at)?;
        Ok(T::get(
            &self.buf[at as usize..],
            self.big_endian,
        ))
    }

    /// Read a big-endian 32-bit magic and compare against `expected`.
    ///
    /// A mismatch is always reported; with `critical` the read is also
    /// terminated with [`Error::BadMagic`].
    pub fn expect_magic(&mut self, expected: u32, critical: bool) -> Result<()> {
        let found = self.read_endian::<u32>(EndianSelect::Big)?;
        if found != expected {
            self.signal_invalidity_last::<u32>(Invalidity::Magic { expected, found });
            if critical {
                return Err(Error::BadMagic { expected, found });
            }
        }
        Ok(())
    }

    /// Read a 16-bit byte-order mark and adopt the endianness it selects:
    /// `0xFEFF` for big-endian streams, `0xFFFE` for little-endian ones.
    /// Any other mark is warned about and leaves the endian flag as it was.
    pub fn expect_bom(&mut self) -> Result<()> {
        let mark = self.read_endian::<u16>(EndianSelect::Big)?;
        match mark {
            0xfeff => self.set_endian(true),
            0xfffe => self.set_endian(false),
            found => self.signal_invalidity_last::<u16>(Invalidity::ByteOrderMark { found }),
        }
        Ok(())
    }

    /// Run `body` with a named frame on the dispatch stack, so warnings
    /// raised inside carry this region in their trace. The frame is popped
    /// on every exit path.
    pub fn with_region<R>(
        &mut self,
        name: &'static str,
        body: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let start = self.tell();
        let saved = self.stack.enter(name, start, start, 0)?;
        let result = body(self);
        self.stack.exit(saved);
        result
    }

    /// Run `body` with the cursor seeked by `whence`/`delta`, restoring the
    /// current position afterwards, error or not.
    pub fn jump<R>(
        &mut self,
        whence: Whence,
        delta: i64,
        body: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let back = self.tell();
        self.seek(whence, delta, 0)?;
        let result = body(self);
        self.cursor.seek_set(back);
        result
    }

    /// Run `body` at the current position, then seek by `whence`/`delta`
    /// from where the body started.
    pub fn jump_out<R>(
        &mut self,
        whence: Whence,
        delta: i64,
        body: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let start = self.tell();
        match body(self) {
            Ok(value) => {
                self.cursor.seek_set(start);
                self.seek(whence, delta, 0)?;
                Ok(value)
            }
            Err(e) => {
                self.cursor.seek_set(start);
                let _ = self.seek(whence, delta, 0);
                Err(e)
            }
        }
    }

    /// Debug assertion that `body` consumed exactly `size` bytes.
    pub fn expect_sized<R>(
        &mut self,
        size: u32,
        body: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let start = self.tell();
        let result = body(self);
        if result.is_ok() {
            debug_assert_eq!(
                self.tell() as i64 - start as i64,
                size as i64,
                "scope was expected to consume {} bytes",
                size
            );
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diag::MemorySink;
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn read_advances_peek_does_not() {
        let data = [0x12, 0x34, 0x56, 0x78];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.peek::<u16>().unwrap(), 0x1234);
        assert_eq!(reader.tell(), 0);
        assert_eq!(reader.read::<u16>().unwrap(), 0x1234);
        assert_eq!(reader.tell(), 2);
        assert_eq!(reader.read::<u16>().unwrap(), 0x5678);
    }

    #[test]
    fn endian_override_and_switch() {
        let data = [0x01, 0x02];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.peek_endian::<u16>(EndianSelect::Little).unwrap(), 0x0201);
        assert_eq!(reader.peek::<u16>().unwrap(), 0x0102);
        reader.switch_endian();
        assert_eq!(reader.peek::<u16>().unwrap(), 0x0201);
    }

    #[test]
    fn bounds_are_fatal_and_warned() {
        let data = [0u8; 3];
        let mut sink = MemorySink::new();
        {
            let mut reader = Reader::with_sink(&data, Box::new(&mut sink));
            assert!(reader.read::<u32>().is_err());
        }
        assert_eq!(sink.len(), 1);
        assert!(sink.warnings[0].message.contains("out of bounds"));
    }

    #[test]
    fn boundary_read_succeeds() {
        let data = [0u8; 8];
        let mut reader = Reader::new(&data);
        reader.seek_set(4);
        assert!(reader.read::<u32>().is_ok());
        assert_eq!(reader.tell(), 8);
        reader.seek_set(5);
        assert!(reader.read::<u32>().is_err());
    }

    #[test]
    fn misaligned_read_warns_but_proceeds() {
        let data = [0, 0x11, 0x22, 0x33, 0x44];
        let mut sink = MemorySink::new();
        {
            let mut reader = Reader::with_sink(&data, Box::new(&mut sink));
            reader.seek_set(1);
            assert_eq!(reader.read::<u32>().unwrap(), 0x11223344);
        }
        assert_eq!(sink.len(), 1);
        assert!(sink.warnings[0].message.contains("alignment"));
    }

    #[test]
    fn alignment_check_can_be_disabled() {
        let data = [0u8; 8];
        let mut sink = MemorySink::new();
        {
            let mut reader = Reader::with_sink(&data, Box::new(&mut sink)).with_options(
                ReaderOptions {
                    check_alignment: false,
                    ..ReaderOptions::default()
                },
            );
            reader.seek_set(1);
            reader.read::<u32>().unwrap();
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn peek_at_translates_without_moving() {
        let data = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut reader = Reader::new(&data);
        reader.seek_set(1);
        assert_eq!(reader.peek_at::<u8>(2).unwrap(), 0xDD);
        assert_eq!(reader.peek_at::<u8>(-1).unwrap(), 0xAA);
        assert_eq!(reader.tell(), 1);
        assert!(reader.peek_at::<u8>(-2).is_err());
    }

    #[test]
    fn read_array_is_stream_ordered() {
        let data = [0x00, 0x01, 0x00, 0x02, 0x00, 0x03];
        let mut reader = Reader::new(&data);
        let values: [u16; 3] = reader.read_array().unwrap();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn magic_match_is_silent() {
        let data = 0x464f524du32.to_be_bytes(); // FORM
        let mut sink = MemorySink::new();
        {
            let mut reader = Reader::with_sink(&data, Box::new(&mut sink));
            reader.expect_magic(0x464f524d, true).unwrap();
            assert_eq!(reader.tell(), 4);
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn magic_mismatch_warns_and_optionally_terminates() {
        let data = 0x464f524du32.to_be_bytes();
        let mut sink = MemorySink::new();
        {
            let mut reader = Reader::with_sink(&data, Box::new(&mut sink));
            assert!(reader.expect_magic(0x52494646, false).is_ok()); // RIFF
            reader.seek_set(0);
            match reader.expect_magic(0x52494646, true) {
                Err(Error::BadMagic { expected, found }) => {
                    assert_eq!(expected, 0x52494646);
                    assert_eq!(found, 0x464f524d);
                }
                other => panic!("expected BadMagic, got {:?}", other),
            }
        }
        assert_eq!(sink.len(), 2);
        assert!(sink.warnings[0].message.contains("'FORM'"));
    }

    #[test]
    fn bom_selects_endianness() {
        let mut sink = MemorySink::new();
        let be = [0xfe, 0xff];
        let mut reader = Reader::with_sink(&be, Box::new(&mut sink));
        reader.expect_bom().unwrap();
        assert!(reader.is_big_endian());
        drop(reader);

        let le = [0xff, 0xfe];
        let mut reader = Reader::with_sink(&le, Box::new(&mut sink));
        reader.expect_bom().unwrap();
        assert!(!reader.is_big_endian());
        drop(reader);

        let bad = [0x12, 0x21];
        let mut reader = Reader::with_sink(&bad, Box::new(&mut sink));
        reader.expect_bom().unwrap();
        assert!(reader.is_big_endian());
        drop(reader);
        assert_eq!(sink.len(), 1);
        assert!(sink.warnings[0].message.contains("byte-order mark"));
    }

    #[test]
    fn jump_restores_position() {
        let data = [0u8; 16];
        let mut reader = Reader::new(&data);
        reader.seek_set(4);
        let byte = reader
            .jump(Whence::Set, 12, |r| {
                assert_eq!(r.tell(), 12);
                r.read::<u8>()
            })
            .unwrap();
        assert_eq!(byte, 0);
        assert_eq!(reader.tell(), 4);
    }

    #[test]
    fn jump_restores_on_error_too() {
        let data = [0u8; 16];
        let mut reader = Reader::new(&data);
        reader.seek_set(4);
        let result = reader.jump(Whence::Set, 15, |r| r.read::<u32>());
        assert!(result.is_err());
        assert_eq!(reader.tell(), 4);
    }

    #[test]
    fn jump_out_seeks_after_the_body() {
        let data = [0u8; 16];
        let mut reader = Reader::new(&data);
        reader
            .jump_out(Whence::Current, 8, |r| {
                r.seek_set(2);
                Ok(())
            })
            .unwrap();
        assert_eq!(reader.tell(), 8);
    }

    #[test]
    fn named_reader_prefixes_warnings() {
        let data = [0u8; 1];
        let mut sink = MemorySink::new();
        {
            let mut reader = Reader::with_sink(&data, Box::new(&mut sink)).named("course.bin");
            let _ = reader.read::<u32>();
        }
        assert!(sink.warnings[0].message.starts_with("course.bin: "));
    }

    quickcheck! {
        fn prop_peek_read_agree(data: Vec<u8>, start: u8) -> TestResult {
            let start = start as u32;
            if (data.len() as u32) < start + 4 {
                return TestResult::discard();
            }
            let mut reader = Reader::new(&data).with_options(ReaderOptions {
                check_alignment: false,
                ..ReaderOptions::default()
            });
            reader.seek_set(start);
            let peeked = reader.peek::<u32>().unwrap();
            let read = reader.read::<u32>().unwrap();
            TestResult::from_bool(peeked == read && reader.tell() == start + 4)
        }
    }
}
