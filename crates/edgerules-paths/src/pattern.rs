//! Colon-syntax pattern compilation.
//!
//! The compiler matches concrete paths against edge-syntax route patterns in
//! two places: attributing back-reference-less prerender entries to a page,
//! and checking middleware matcher coverage. This module converts a colon
//! pattern into an anchored [`Regex`] for those checks. It is not the edge
//! engine's matcher; it only needs to agree with it on canonical paths.

use regex::Regex;

/// Error converting a colon-syntax pattern to a regex.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A segment could not be parsed as a literal or parameter.
    #[error("invalid pattern segment '{segment}' in '{pattern}'")]
    InvalidSegment { pattern: String, segment: String },
    /// The generated regex failed to compile.
    #[error("invalid regex generated from '{pattern}'")]
    Regex {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// True if a regex source uses capture syntax the edge engine cannot
/// express (named captures and lookbehind).
#[must_use]
pub fn has_named_capture(source: &str) -> bool {
    source.contains("(?P<") || source.contains("(?<")
}

/// Compile an edge colon-syntax pattern into an anchored regex.
///
/// Segment forms: literal, `:name` (one segment), `:name+` (one or more),
/// `:name*` (zero or more), `:name(a|b)` (constrained), and a trailing `?`
/// marking the segment optional. Optional segments absorb their leading
/// slash so `/:locale(en|fr)?/about` matches both `/about` and `/en/about`.
///
/// # Errors
///
/// Returns [`PatternError`] for malformed parameter segments or when the
/// generated regex fails to compile.
pub fn pattern_to_regex(pattern: &str) -> Result<Regex, PatternError> {
    let mut body = String::with_capacity(pattern.len() * 2);
    let mut all_optional = true;

    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let (piece, optional) = segment_to_regex(pattern, segment)?;
        body.push_str(&piece);
        all_optional &= optional;
    }

    // A pattern made entirely of optional segments must still match the
    // bare root path.
    let source = if all_optional {
        format!("^{body}/?$")
    } else {
        format!("^{body}$")
    };

    Regex::new(&source).map_err(|e| PatternError::Regex {
        pattern: pattern.to_owned(),
        source: Box::new(e),
    })
}

/// Convert one path segment; returns the regex piece and whether it is
/// optional (matches the empty path).
fn segment_to_regex(pattern: &str, segment: &str) -> Result<(String, bool), PatternError> {
    let Some(param) = segment.strip_prefix(':') else {
        return Ok((format!("/{}", regex::escape(segment)), false));
    };

    let invalid = || PatternError::InvalidSegment {
        pattern: pattern.to_owned(),
        segment: segment.to_owned(),
    };

    let name_len = param
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(param.len());
    if name_len == 0 {
        return Err(invalid());
    }
    let mut rest = &param[name_len..];

    // Optional constraint group, e.g. "(en|fr)".
    let constraint = if rest.starts_with('(') {
        let end = matching_paren(rest).ok_or_else(invalid)?;
        let inner = &rest[1..end];
        rest = &rest[end + 1..];
        Some(inner)
    } else {
        None
    };

    let piece = match (rest, constraint) {
        ("", None) => ("/[^/]+".to_owned(), false),
        ("", Some(c)) => (format!("/(?:{c})"), false),
        ("?", None) => ("(?:/[^/]+)?".to_owned(), true),
        ("?", Some(c)) => (format!("(?:/(?:{c}))?"), true),
        ("+", None) => ("/.+".to_owned(), false),
        ("*", None) => ("(?:/.+)?".to_owned(), true),
        _ => return Err(invalid()),
    };
    Ok(piece)
}

/// Index of the parenthesis closing the group opened at byte 0.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        pattern_to_regex(pattern).unwrap().is_match(path)
    }

    #[test]
    fn test_literal_pattern() {
        assert!(matches("/about", "/about"));
        assert!(!matches("/about", "/about/us"));
        assert!(!matches("/about", "/contact"));
    }

    #[test]
    fn test_single_param() {
        assert!(matches("/products/:id", "/products/42"));
        assert!(!matches("/products/:id", "/products"));
        assert!(!matches("/products/:id", "/products/42/reviews"));
    }

    #[test]
    fn test_catch_all_param() {
        assert!(matches("/docs/:path+", "/docs/a"));
        assert!(matches("/docs/:path+", "/docs/a/b/c"));
        assert!(!matches("/docs/:path+", "/docs"));
    }

    #[test]
    fn test_optional_catch_all_param() {
        assert!(matches("/shop/:cat*", "/shop"));
        assert!(matches("/shop/:cat*", "/shop/a/b"));
        assert!(!matches("/shop/:cat*", "/store"));
    }

    #[test]
    fn test_constrained_param() {
        assert!(matches("/:locale(en|fr)/about", "/en/about"));
        assert!(!matches("/:locale(en|fr)/about", "/de/about"));
    }

    #[test]
    fn test_optional_locale_group() {
        let pattern = "/:locale(en|fr)?/about";

        assert!(matches(pattern, "/about"));
        assert!(matches(pattern, "/en/about"));
        assert!(matches(pattern, "/fr/about"));
        assert!(!matches(pattern, "/de/about"));
    }

    #[test]
    fn test_all_optional_matches_root() {
        assert!(matches("/:locale(en|fr)?", "/"));
        assert!(matches("/:locale(en|fr)?", "/en"));
        assert!(!matches("/:locale(en|fr)?", "/en/about"));
    }

    #[test]
    fn test_data_route_optional_locale() {
        let pattern = "/__edge__/data/b1/:locale(en|fr)?/index.json";

        assert!(matches(pattern, "/__edge__/data/b1/index.json"));
        assert!(matches(pattern, "/__edge__/data/b1/en/index.json"));
        assert!(!matches(pattern, "/__edge__/data/b2/index.json"));
    }

    #[test]
    fn test_literal_escaping() {
        assert!(matches("/file.json", "/file.json"));
        assert!(!matches("/file.json", "/fileXjson"));
    }

    #[test]
    fn test_invalid_segment_rejected() {
        assert!(matches("/ok/:id", "/ok/1"));
        assert!(pattern_to_regex("/bad/:").is_err());
        assert!(pattern_to_regex("/bad/:name(unclosed").is_err());
    }

    #[test]
    fn test_has_named_capture() {
        assert!(has_named_capture("(?P<name>x)"));
        assert!(has_named_capture("(?<name>x)"));
        assert!(!has_named_capture("(en|fr)"));
    }
}
