//! Shorthands for building and returning [`crate::error::IngestError`] values.

/// Creates an [`crate::error::IngestError`] from a kind and a static description.
///
/// An optional third argument is rendered with `to_string()` and stored as the error detail;
/// a trailing `source: err` attaches the originating error.
///
/// ```
/// use ingest::error::ErrorKind;
/// use ingest::ingest_error;
///
/// let err = ingest_error!(ErrorKind::InvalidData, "rating is not a number", "rating=abc");
/// assert_eq!(err.detail(), Some("rating=abc"));
/// ```
#[macro_export]
macro_rules! ingest_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::IngestError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::IngestError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::IngestError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::IngestError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Returns early with an [`crate::error::IngestError`] built by [`ingest_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::ingest_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::ingest_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::ingest_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::ingest_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
