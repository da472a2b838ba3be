/// Declare a named read handler: a unit struct implementing
/// [`Handler`](crate::read::Handler) for the given context type.
///
/// ```
/// blocklink::block_handler!(CountEntries, "entry table", u32, |reader, count| {
///     *count = reader.read::<u16>()? as u32;
///     Ok(())
/// });
///
/// let data = [0x00, 0x03];
/// let mut reader = blocklink::Reader::new(&data);
/// let mut count = 0u32;
/// reader.dispatch::<CountEntries, _>(&mut count).unwrap();
/// assert_eq!(count, 3);
/// ```
#[macro_export]
macro_rules! block_handler {
    ($handler:ident, $desc:expr, $ctx:ty, |$reader:ident, $context:ident| $body:block) => {
        pub struct $handler;

        impl $crate::read::Handler<$ctx> for $handler {
            const NAME: &'static str = $desc;

            fn on_read(
                $reader: &mut $crate::read::Reader<'_>,
                $context: &mut $ctx,
            ) -> $crate::Result<()> {
                $body
            }
        }
    };
}
