use tracing::debug;
use whatlang::{Detector, Lang};

/// Detects the language of a block of text, returning an ISO 639-1 code.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<String>;
}

/// Detector restricted to the languages media libraries are usually
/// organized in. Unreliable detections are discarded.
pub struct WhatlangDetector {
    detector: Detector,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self {
            detector: Detector::with_allowlist(vec![Lang::Eng, Lang::Fra, Lang::Deu, Lang::Spa]),
        }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = self.detector.detect(text)?;
        if !info.is_reliable() {
            debug!(
                lang = ?info.lang(),
                confidence = info.confidence(),
                "Ignoring unreliable language detection"
            );
            return None;
        }
        iso_639_1(info.lang()).map(str::to_string)
    }
}

fn iso_639_1(lang: Lang) -> Option<&'static str> {
    match lang {
        Lang::Eng => Some("en"),
        Lang::Fra => Some("fr"),
        Lang::Deu => Some("de"),
        Lang::Spa => Some("es"),
        _ => None,
    }
}

/// Chooses the language used for provider requests.
///
/// Entries without a resolved ancestor use the default language. Entries
/// below one inherit the ancestor's context language, which a directory may
/// replace with the language detected over its children's names.
pub struct LanguageResolver {
    default_language: String,
    detector: Box<dyn LanguageDetector>,
}

impl LanguageResolver {
    pub fn new(default_language: impl Into<String>, detector: Box<dyn LanguageDetector>) -> Self {
        Self {
            default_language: default_language.into(),
            detector,
        }
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    pub fn with_detector(mut self, detector: Box<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn request_language(&self, ancestor_language: Option<&str>) -> String {
        ancestor_language
            .unwrap_or(&self.default_language)
            .to_string()
    }

    pub fn children_language(&self, names: &[String]) -> Option<String> {
        if names.is_empty() {
            return None;
        }
        self.detector.detect(&names.join("\n"))
    }
}
