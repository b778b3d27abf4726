/// Validates a post-login/post-logout `next` destination to prevent open redirects.
///
/// Returns `Some(url)` if the URL is a valid local path, `None` otherwise.
///
/// # Security
///
/// Accepted URLs:
/// - Start with a single `/` (relative path)
/// - Do not start with `//` (protocol-relative URLs like `//evil.com`)
/// - Do not contain `\` (browsers read `/\evil.com` as `//evil.com`)
/// - Do not contain control characters
/// - Do not contain `://`
///
/// # Examples
///
/// ```
/// use relyingparty_core::protocol::validate_next;
///
/// assert_eq!(validate_next("/account/settings"), Some("/account/settings"));
/// assert_eq!(validate_next("//evil.com"), None);
/// assert_eq!(validate_next("https://evil.com"), None);
/// ```
pub fn validate_next(url: &str) -> Option<&str> {
    // Must start with /
    if !url.starts_with('/') {
        return None;
    }

    // Reject protocol-relative URLs (//evil.com)
    if url.starts_with("//") {
        return None;
    }

    // Browsers treat backslashes as slashes
    if url.contains('\\') {
        return None;
    }

    // Reject control characters (potential header injection)
    if url.chars().any(|c| c.is_control()) {
        return None;
    }

    // Reject URLs with schemes (https://, javascript:, etc.)
    if url.contains("://") {
        return None;
    }

    Some(url)
}
