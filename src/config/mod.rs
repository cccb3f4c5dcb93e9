//! Configuration module for article conversion
//!
//! Portal descriptions are read from JSON, compiled once into a shared
//! [`CompiledPortal`], and combined with per-run settings in [`RunConfig`].

// Sub-modules
pub mod builder;
pub mod errors;
pub mod getters;
pub mod loader;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, RunConfigBuilder, WithPortal};
pub use errors::ConfigError;
pub use loader::{CompiledPortal, load_portal};
pub use types::{OutputMode, PortalConfig, RunConfig, Thresholds};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{CompiledPortal, PortalConfig};
    use crate::normalize::{DictAction, Dictionary};

    /// Minimal portal for `example.hu` with no selectors beyond `article`.
    pub(crate) fn portal_config() -> PortalConfig {
        serde_json::from_str(
            r#"{
                "portal_name": "example",
                "url_prefix": "https://example.hu",
                "article_roots": ["article", "body"],
                "dictionary_paths": []
            }"#,
        )
        .expect("test portal config is valid")
    }

    pub(crate) fn dictionary(rows: &[(&str, &str, &str)]) -> Dictionary {
        let mut dictionary = Dictionary::default();
        for (signature, normal, preserved) in rows {
            dictionary.insert(
                signature.parse().expect("test signature parses"),
                DictAction::parse(normal, preserved),
            );
        }
        dictionary
    }

    pub(crate) fn portal_with_dictionary(rows: &[(&str, &str, &str)]) -> CompiledPortal {
        portal_config()
            .compile_with_dictionary(dictionary(rows))
            .expect("test portal compiles")
    }
}
