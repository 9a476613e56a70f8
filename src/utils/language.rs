use std::sync::Arc;

use crate::config::Config;
use crate::models::CommentLanguage;

/// Best-effort comment language classification. Implementations must be
/// cheap and infallible; undecidable text is simply `None` and the
/// comment stays unclassified.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<CommentLanguage>;
}

/// Detector backed by whatlang. Only languages the reader screens know
/// how to group are mapped; everything else stays unknown.
#[cfg(feature = "lang-detect")]
pub struct WhatlangDetector;

#[cfg(feature = "lang-detect")]
impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<CommentLanguage> {
        use whatlang::Lang;
        match whatlang::detect_lang(text)? {
            Lang::Eng => Some(CommentLanguage::English),
            Lang::Fra => Some(CommentLanguage::French),
            Lang::Deu => Some(CommentLanguage::German),
            _ => None,
        }
    }
}

/// Resolve the detector donation processing should use: present only
/// when a backend is compiled in and the config asks for it.
pub fn detector_from_config(config: &Config) -> Option<Arc<dyn LanguageDetector>> {
    if !config.comments.detect_language {
        return None;
    }
    #[cfg(feature = "lang-detect")]
    {
        return Some(Arc::new(WhatlangDetector));
    }
    #[cfg(not(feature = "lang-detect"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommentConfig, DatabaseConfig, DrawingConfig};

    fn config(detect: bool) -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgres://localhost/tracker".to_string(),
                max_connections: 1,
            },
            drawing: DrawingConfig::default(),
            comments: CommentConfig {
                detect_language: detect,
            },
        }
    }

    #[test]
    fn test_disabled_config_yields_no_detector() {
        assert!(detector_from_config(&config(false)).is_none());
    }

    #[cfg(not(feature = "lang-detect"))]
    #[test]
    fn test_no_backend_yields_no_detector() {
        assert!(detector_from_config(&config(true)).is_none());
    }

    #[cfg(feature = "lang-detect")]
    #[test]
    fn test_whatlang_detects_plain_english() {
        let detector = WhatlangDetector;
        let lang = detector.detect(
            "Good luck with the run, this donation goes to the animals and the incentive!",
        );
        assert_eq!(lang, Some(CommentLanguage::English));
    }
}
