macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a marker type usable as the `L` parameter of
/// [`ItemLoader`](crate::ItemLoader). The identifier becomes the loader's
/// name in every usage label it reports.
///
/// ```
/// loader_upkeep::loader_type!(pub QuotesItemLoader);
///
/// use loader_upkeep::LoaderType;
/// assert_eq!(QuotesItemLoader::NAME, "QuotesItemLoader");
/// ```
#[macro_export]
macro_rules! loader_type {
    ($(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::LoaderType for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
}
