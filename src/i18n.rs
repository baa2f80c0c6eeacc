//! Message tables for the error notifications shown by the listing view.

use serde::{Deserialize, Serialize};

use crate::collaborators::Localizer;

pub const AUTH_FAILED_CHECK_PASSWORD: &str = "error.auth_failed_check_password";
pub const GENERIC_LOAD_FAILED: &str = "error.generic_load_failed";
pub const DELETE_FAILED: &str = "error.delete_failed";

/// Supported UI languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Locale::En => &[
                (
                    AUTH_FAILED_CHECK_PASSWORD,
                    "Authentication failed. Please check your password and try again.",
                ),
                (GENERIC_LOAD_FAILED, "Failed to load files. Please try again later."),
                (DELETE_FAILED, "Failed to delete file. Please try again later."),
            ],
            Locale::Zh => &[
                (AUTH_FAILED_CHECK_PASSWORD, "认证失败，请检查您的密码后重试。"),
                (GENERIC_LOAD_FAILED, "加载文件失败，请稍后再试。"),
                (DELETE_FAILED, "删除文件失败，请稍后再试。"),
            ],
        }
    }
}

/// Localizer backed by the built-in tables. Unknown keys come back verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLocalizer {
    locale: Locale,
}

impl StaticLocalizer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl Localizer for StaticLocalizer {
    fn translate(&self, key: &str) -> String {
        self.locale
            .table()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_messages() {
        let l = StaticLocalizer::new(Locale::En);
        assert_eq!(
            l.translate(DELETE_FAILED),
            "Failed to delete file. Please try again later."
        );
        assert_eq!(
            l.translate(GENERIC_LOAD_FAILED),
            "Failed to load files. Please try again later."
        );
    }

    #[test]
    fn test_chinese_messages() {
        let l = StaticLocalizer::new(Locale::Zh);
        assert_eq!(l.translate(AUTH_FAILED_CHECK_PASSWORD), "认证失败，请检查您的密码后重试。");
    }

    #[test]
    fn test_every_locale_covers_every_key() {
        for locale in [Locale::En, Locale::Zh] {
            let l = StaticLocalizer::new(locale);
            for key in [AUTH_FAILED_CHECK_PASSWORD, GENERIC_LOAD_FAILED, DELETE_FAILED] {
                assert_ne!(l.translate(key), key, "{:?} is missing {}", locale, key);
            }
        }
    }

    #[test]
    fn test_unknown_key_passthrough() {
        let l = StaticLocalizer::default();
        assert_eq!(l.translate("error.unknown"), "error.unknown");
    }

    #[test]
    fn test_locale_serde() {
        assert_eq!(serde_json::to_string(&Locale::Zh).unwrap(), "\"zh\"");
        let parsed: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Locale::En);
    }
}
