//! Languages offered by the translation service.
//!
//! The service expects display names (`"Arabic"`), not codes; codes are
//! accepted on input for convenience.

/// Source-language value asking the service to detect the language.
pub const AUTO_DETECT: &str = "auto";
/// Target language selected when nothing else is chosen.
pub const DEFAULT_TARGET: &str = "Arabic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

pub const LANGUAGES: &[Language] = &[
    Language { name: "Arabic", code: "ar" },
    Language { name: "English", code: "en" },
    Language { name: "French", code: "fr" },
    Language { name: "German", code: "de" },
    Language { name: "Spanish", code: "es" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
    Language { name: "Dutch", code: "nl" },
    Language { name: "Russian", code: "ru" },
    Language { name: "Turkish", code: "tr" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Korean", code: "ko" },
    Language { name: "Chinese (Simplified)", code: "zh-CN" },
    Language { name: "Hindi", code: "hi" },
    Language { name: "Indonesian", code: "id" },
    Language { name: "Polish", code: "pl" },
    Language { name: "Swedish", code: "sv" },
    Language { name: "Vietnamese", code: "vi" },
];

/// Looks a language up by display name or code, ignoring ASCII case.
pub fn find(query: &str) -> Option<&'static Language> {
    let query = query.trim();
    LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(query) || lang.code.eq_ignore_ascii_case(query))
}

/// Canonical target-language value for `query`.
pub fn resolve_target(query: &str) -> Option<&'static str> {
    find(query).map(|lang| lang.name)
}

/// Canonical source-language value for `query`; auto-detection is allowed here only.
pub fn resolve_source(query: &str) -> Option<&'static str> {
    let trimmed = query.trim();
    if trimmed.eq_ignore_ascii_case(AUTO_DETECT) || trimmed.eq_ignore_ascii_case("auto-detect") {
        return Some(AUTO_DETECT);
    }
    resolve_target(trimmed)
}
