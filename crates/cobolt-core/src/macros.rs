/// Expands to the name of the enclosing function, without the module path.
///
/// Used as the `context` attached to decode errors.
#[macro_export]
macro_rules! function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            core::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = &name[..name.len() - 3];
        match name.rfind(':') {
            Some(pos) => &name[pos + 1..],
            None => name,
        }
    }};
}

/// Fails the enclosing decode function when fewer than `size` bytes remain.
#[macro_export]
macro_rules! ensure_size {
    (in: $buf:ident, size: $expected:expr) => {{
        let received = $buf.len();
        let expected = $expected;
        if !(received >= expected) {
            return Err($crate::DecodeErrorExt::not_enough_bytes(
                $crate::function!(),
                received,
                expected,
            ));
        }
    }};
}
