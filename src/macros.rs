#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

#[macro_export]
macro_rules! re {
    ($pat:literal) => {
        $crate::Pattern::Static($crate::regex!($pat))
    };
}

#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        filter: $filter:expr,
        pattern: $pattern:expr
        $(, strip: $strip:expr)?
        $(, reject: $reject:expr)?
        $(,)?
    ) => {{
        $crate::Rule {
            name: $name,
            filter: $filter,
            pattern: $pattern,
            strip: { None::<$crate::Pattern> $(.or(Some($strip)))? },
            reject: { None::<$crate::Pattern> $(.or(Some($reject)))? },
        }
    }};
}
