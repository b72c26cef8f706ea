use serde::Serialize;

/// Locale
///
/// The two languages the site is published in. Every page lives under a locale prefix
/// (`/my/...`, `/en/...`); Burmese is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    My,
    En,
}

impl Locale {
    /// All published locales, default first.
    pub const ALL: [Locale; 2] = [Locale::My, Locale::En];

    /// Parses a URL prefix. Only the exact lowercase codes are accepted.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "my" => Some(Locale::My),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::My => "my",
            Locale::En => "en",
        }
    }

    /// Value for `og:locale`.
    pub fn og_locale(self) -> &'static str {
        match self {
            Locale::My => "my_MM",
            Locale::En => "en_US",
        }
    }

    pub fn html_lang(self) -> &'static str {
        self.code()
    }

    /// Label shown in the locale switcher.
    pub fn label(self) -> &'static str {
        match self {
            Locale::My => "မြန်မာ",
            Locale::En => "EN",
        }
    }

    /// Prefixes a site path (with or without a leading slash) with this locale.
    /// An empty path yields the locale root.
    pub fn href(self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("/{}", self.code())
        } else {
            format!("/{}/{}", self.code(), path)
        }
    }
}

/// switch_locale_href
///
/// Rewrites a request path and query onto `target`, keeping everything after the locale
/// segment. The query string is preserved so state such as `?course=slug` on the
/// enrollment success page survives a language switch.
pub fn switch_locale_href(target: Locale, path: &str, query: Option<&str>) -> String {
    let rest = path
        .trim_start_matches('/')
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or("");
    let href = target.href(rest);
    match query {
        Some(q) if !q.is_empty() => format!("{href}?{q}"),
        _ => href,
    }
}
