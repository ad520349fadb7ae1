/// Policy for object keys that are not declared in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Fail the parse with
    /// [`DemuxError::UnknownField`](crate::DemuxError::UnknownField).
    #[default]
    Error,
    /// Consume one balanced value after the unknown key without emitting it
    /// anywhere, then continue with the next field.
    Skip,
}

/// Configuration options for [`JsonDemux`](crate::JsonDemux).
///
/// # Examples
///
/// ```
/// use jsondemux::{DemuxOptions, UnknownFieldPolicy};
///
/// let options = DemuxOptions {
///     unknown_fields: UnknownFieldPolicy::Skip,
///     ..Default::default()
/// };
/// assert!(!options.allow_unicode_whitespace);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DemuxOptions {
    /// What to do when an object key is missing from the schema.
    ///
    /// # Default
    ///
    /// [`UnknownFieldPolicy::Error`]
    pub unknown_fields: UnknownFieldPolicy,

    /// Whether to allow any Unicode whitespace between JSON tokens.
    ///
    /// By default only the four whitespace characters of the JSON grammar are
    /// skipped: space (U+0020), line feed (U+000A), carriage return (U+000D)
    /// and horizontal tab (U+0009).
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unicode_whitespace: bool,
}

impl DemuxOptions {
    #[inline]
    pub(crate) fn is_whitespace(&self, ch: char) -> bool {
        matches!(ch, ' ' | '\t' | '\n' | '\r')
            || (self.allow_unicode_whitespace && ch.is_whitespace())
    }
}
