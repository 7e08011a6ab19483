pub mod interface;
pub mod client;
pub mod auto;

pub use interface::{LanguageEntry, TranslatorInterface};
pub use client::WatsonTranslatorClient;
pub use auto::AutoTranslator;
