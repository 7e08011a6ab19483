use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::error::BotResult;
use crate::translate::{LanguageEntry, TranslatorInterface};

pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Display names of identifiable languages, keyed by language code.
///
/// Filled once at startup and never refreshed.
#[derive(Default)]
pub struct LanguageDirectory {
    entries: DashMap<String, LanguageEntry>,
    loaded: AtomicBool,
}

impl LanguageDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the directory from the translation service.
    pub async fn load(&self, translator: &dyn TranslatorInterface) -> BotResult<usize> {
        let languages = translator.list_identifiable_languages().await?;
        for entry in languages {
            self.entries.insert(entry.code.clone(), entry);
        }
        self.loaded.store(true, Ordering::Release);

        let count = self.entries.len();
        info!("Started with {} detectable languages", count);
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Human-readable name for `code`, or `"unknown"`.
    pub fn display_name(&self, code: Option<&str>) -> String {
        code.and_then(|c| self.entries.get(c))
            .map(|e| e.value().name.clone())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
    }
}
