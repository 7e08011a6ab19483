//! Automatic translation between English and Japanese.
//!
//! The direction is a fixed toggle: English text goes to Japanese, text in
//! any other language goes to English. Only these two codes are ever chosen
//! as the target.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use super::interface::{IdentifiedLanguage, TranslatorInterface};
use crate::error::{BotError, BotResult};

pub const ENGLISH: &str = "en";
pub const JAPANESE: &str = "ja";

pub const NOT_UNDERSTOOD: &str = "Sorry, I couldn't understand that sentence";
pub const ALREADY_TRANSLATED: &str = "That message seems to be already translated!";

/// Outcome of one auto-translate call.
///
/// `source` and `target` belong to this request alone; they are `None` when
/// no language could be identified.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoTranslation {
    pub text: String,
    pub source: Option<String>,
    pub target: Option<String>,
}

/// Target language for text identified as `source`.
pub fn target_for(source: &str) -> &'static str {
    if source == ENGLISH {
        JAPANESE
    } else {
        ENGLISH
    }
}

/// Highest-confidence candidate. Equal confidences keep the earliest
/// candidate; NaN ranks below everything else.
pub fn best_candidate(candidates: &[IdentifiedLanguage]) -> Option<&IdentifiedLanguage> {
    candidates.iter().reduce(|best, next| {
        match next.confidence.partial_cmp(&best.confidence) {
            Some(Ordering::Greater) => next,
            None if best.confidence.is_nan() && !next.confidence.is_nan() => next,
            _ => best,
        }
    })
}

#[derive(Clone)]
pub struct AutoTranslator {
    translator: Arc<dyn TranslatorInterface>,
}

impl AutoTranslator {
    pub fn new(translator: Arc<dyn TranslatorInterface>) -> Self {
        Self { translator }
    }

    pub async fn auto_translate(&self, text: &str) -> BotResult<AutoTranslation> {
        let candidates = self.translator.identify(text).await?;

        let Some(best) = best_candidate(&candidates) else {
            info!("No language identified for {:?}", text);
            return Ok(AutoTranslation {
                text: NOT_UNDERSTOOD.to_string(),
                source: None,
                target: None,
            });
        };

        let source = best.language.clone();
        let target = target_for(&source).to_string();
        debug!(
            "Identified {} (confidence {}), translating to {}",
            source, best.confidence, target
        );

        if source == target {
            return Ok(AutoTranslation {
                text: ALREADY_TRANSLATED.to_string(),
                source: Some(source),
                target: Some(target),
            });
        }

        let response = self.translator.translate(text, &source, &target).await?;
        let translated = response
            .translations
            .into_iter()
            .next()
            .map(|t| t.translation)
            .ok_or_else(|| {
                BotError::TranslationFailed(format!(
                    "Service returned no translation for {} -> {}",
                    source, target
                ))
            })?;

        Ok(AutoTranslation {
            text: translated,
            source: Some(source),
            target: Some(target),
        })
    }
}
