//! Base URL / endpoint joining.

/// Join `base` and `path` with exactly one `/` at the seam.
///
/// `path` is expected to start with `/`; callers validate that before
/// joining.
pub fn join_url(base: &str, path: &str) -> String {
    match (base.strip_suffix('/'), path.starts_with('/')) {
        (Some(trimmed), true) => format!("{trimmed}{path}"),
        (None, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_without_trailing_slash() {
        assert_eq!(join_url("https://x.com/api", "/foo/"), "https://x.com/api/foo/");
    }

    #[test]
    fn base_with_trailing_slash() {
        assert_eq!(join_url("https://x.com/api/", "/foo/"), "https://x.com/api/foo/");
    }

    #[test]
    fn only_one_slash_is_collapsed() {
        assert_eq!(join_url("https://x.com/api//", "/foo"), "https://x.com/api//foo");
    }

    #[test]
    fn missing_slash_is_inserted() {
        assert_eq!(join_url("https://x.com/api", "foo"), "https://x.com/api/foo");
    }
}
