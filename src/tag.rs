//! Container registry tag-name sanitizing
//!
//! Registry tags may contain ASCII letters, digits, underscores, periods and
//! dashes, may not start with a period or a dash, and are limited to 128
//! characters.

/// Maximum length of a registry tag
pub const MAX_TAG_LENGTH: usize = 128;

/// Turns an arbitrary string into a valid registry tag.
///
/// Every disallowed character becomes `_`, a leading `.` or `-` becomes `_`,
/// and the result is truncated to [`MAX_TAG_LENGTH`] characters. An empty
/// input yields an empty tag.
///
/// ```
/// use shipwright::tag::sanitize_tag;
///
/// assert_eq!(sanitize_tag("feature/foo"), "feature_foo");
/// assert_eq!(sanitize_tag(".bad"), "_bad");
/// ```
pub fn sanitize_tag(raw: &str) -> String {
    let mut tag: String = raw
        .chars()
        .map(|c| if is_tag_char(c) { c } else { '_' })
        .collect();

    if tag.starts_with('.') || tag.starts_with('-') {
        tag.replace_range(..1, "_");
    }

    if let Some(idx) = tag.find('/') {
        tag.remove(idx);
    }

    // Only ASCII survives the mapping above, so byte and char counts agree.
    tag.truncate(MAX_TAG_LENGTH);
    tag
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}
