//! Locale prefix detection, stripping, and default-locale aliasing.

/// Configured locale set for a build.
///
/// An empty set makes every method an identity or no-op, so callers never
/// branch on whether locales are configured.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Locales {
    locales: Vec<String>,
    default_locale: Option<String>,
}

impl Locales {
    /// Create a locale set from the route-policy registry.
    #[must_use]
    pub fn new(locales: Vec<String>, default_locale: Option<String>) -> Self {
        Self {
            locales,
            default_locale,
        }
    }

    /// Locale set for builds without locale configuration.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// True if no locales are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// Configured locales in registry order.
    #[must_use]
    pub fn all(&self) -> &[String] {
        &self.locales
    }

    /// The configured default locale, if any.
    #[must_use]
    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    /// Detect a locale prefix on a path.
    ///
    /// The test is a plain prefix comparison: `/en` or `/en/...` matches the
    /// `en` locale. Returns the matched locale so callers can avoid wrapping
    /// already-localized manifest keys a second time.
    #[must_use]
    pub fn locale_of(&self, path: &str) -> Option<&str> {
        self.locales.iter().map(String::as_str).find(|locale| {
            path.strip_prefix('/')
                .and_then(|rest| rest.strip_prefix(locale))
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// Strip a locale prefix, yielding the locale-free path.
    ///
    /// `/en/about` becomes `/about`, `/en` becomes `/`. Paths without a
    /// configured locale prefix are returned unchanged.
    #[must_use]
    pub fn strip(&self, path: &str) -> String {
        match self.locale_of(path) {
            Some(locale) => {
                let rest = &path[1 + locale.len()..];
                if rest.is_empty() {
                    "/".to_owned()
                } else {
                    rest.to_owned()
                }
            }
            None => path.to_owned(),
        }
    }

    /// Optional locale-capture group in edge syntax, e.g. `:locale(en|fr)?`.
    ///
    /// `None` when no locales are configured.
    #[must_use]
    pub fn capture_group(&self) -> Option<String> {
        if self.locales.is_empty() {
            return None;
        }
        Some(format!(":locale({})?", self.locales.join("|")))
    }

    /// Locale-qualify a path with the default locale.
    ///
    /// Used to look up concrete paths in the prerender registry, which keys
    /// its entries by localized path when locales are configured. Paths that
    /// already carry a locale prefix are returned unchanged.
    #[must_use]
    pub fn qualify(&self, path: &str) -> String {
        let Some(default) = self.default_locale.as_deref() else {
            return path.to_owned();
        };
        if self.locale_of(path).is_some() {
            return path.to_owned();
        }
        if path == "/" {
            format!("/{default}")
        } else {
            format!("/{default}{path}")
        }
    }

    /// Locale-free alias for a default-locale-prefixed path.
    ///
    /// Returns `Some("/about")` for `/en/about` when `en` is the default
    /// locale, `None` for every other path. The alias is emitted in addition
    /// to the prefixed path, never instead of it.
    #[must_use]
    pub fn default_alias(&self, path: &str) -> Option<String> {
        let default = self.default_locale.as_deref()?;
        if self.locale_of(path) != Some(default) {
            return None;
        }
        Some(self.strip(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_fr() -> Locales {
        Locales::new(
            vec!["en".to_owned(), "fr".to_owned()],
            Some("en".to_owned()),
        )
    }

    #[test]
    fn test_locale_of_detects_prefix() {
        let locales = en_fr();

        assert_eq!(locales.locale_of("/en/about"), Some("en"));
        assert_eq!(locales.locale_of("/fr"), Some("fr"));
        assert_eq!(locales.locale_of("/about"), None);
    }

    #[test]
    fn test_locale_of_requires_segment_boundary() {
        let locales = en_fr();

        // "/end" starts with "en" but is not a locale segment
        assert_eq!(locales.locale_of("/end"), None);
        assert_eq!(locales.locale_of("/entry/list"), None);
    }

    #[test]
    fn test_strip_removes_prefix() {
        let locales = en_fr();

        assert_eq!(locales.strip("/en/about"), "/about");
        assert_eq!(locales.strip("/fr/blog/a"), "/blog/a");
        assert_eq!(locales.strip("/en"), "/");
        assert_eq!(locales.strip("/about"), "/about");
    }

    #[test]
    fn test_capture_group() {
        assert_eq!(en_fr().capture_group().as_deref(), Some(":locale(en|fr)?"));
        assert_eq!(Locales::none().capture_group(), None);
    }

    #[test]
    fn test_qualify_adds_default_locale() {
        let locales = en_fr();

        assert_eq!(locales.qualify("/about"), "/en/about");
        assert_eq!(locales.qualify("/"), "/en");
    }

    #[test]
    fn test_qualify_keeps_localized_paths() {
        let locales = en_fr();

        assert_eq!(locales.qualify("/fr/about"), "/fr/about");
        assert_eq!(locales.qualify("/en/about"), "/en/about");
    }

    #[test]
    fn test_default_alias_only_for_default_locale() {
        let locales = en_fr();

        assert_eq!(locales.default_alias("/en/about").as_deref(), Some("/about"));
        assert_eq!(locales.default_alias("/fr/about"), None);
        assert_eq!(locales.default_alias("/about"), None);
    }

    #[test]
    fn test_default_alias_root() {
        assert_eq!(en_fr().default_alias("/en").as_deref(), Some("/"));
    }

    #[test]
    fn test_no_locales_is_identity() {
        let locales = Locales::none();

        assert_eq!(locales.strip("/en/about"), "/en/about");
        assert_eq!(locales.qualify("/about"), "/about");
        assert_eq!(locales.default_alias("/en/about"), None);
    }
}
