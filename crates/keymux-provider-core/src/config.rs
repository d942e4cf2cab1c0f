use serde::{Deserialize, Serialize};

use crate::flavor::ApiFlavor;

/// One provider record from the configuration snapshot.
///
/// Immutable once loaded; reload replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub flavor: ApiFlavor,
    pub keys: Vec<String>,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderConfigError {
    #[error("provider name must be a non-empty lowercase identifier, got {0:?}")]
    InvalidName(String),
    #[error("duplicate provider name: {0}")]
    DuplicateName(String),
    #[error("provider {0}: no api keys configured")]
    NoKeys(String),
    #[error("provider {0}: api keys must be non-empty")]
    EmptyKey(String),
    #[error("provider {0}: base_url must be an absolute http(s) URL, got {1:?}")]
    InvalidBaseUrl(String, String),
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), ProviderConfigError> {
        if !is_valid_name(&self.name) {
            return Err(ProviderConfigError::InvalidName(self.name.clone()));
        }
        if self.keys.is_empty() {
            return Err(ProviderConfigError::NoKeys(self.name.clone()));
        }
        if self.keys.iter().any(|key| key.trim().is_empty()) {
            return Err(ProviderConfigError::EmptyKey(self.name.clone()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProviderConfigError::InvalidBaseUrl(
                self.name.clone(),
                self.base_url.clone(),
            ));
        }
        Ok(())
    }
}

/// Validates every record and rejects duplicate names.
pub fn validate_providers(providers: &[ProviderSettings]) -> Result<(), ProviderConfigError> {
    let mut seen = std::collections::HashSet::new();
    for provider in providers {
        provider.validate()?;
        if !seen.insert(provider.name.as_str()) {
            return Err(ProviderConfigError::DuplicateName(provider.name.clone()));
        }
    }
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(name: &str) -> ProviderSettings {
        ProviderSettings {
            name: name.to_string(),
            flavor: ApiFlavor::OpenAI,
            keys: vec!["sk-1".to_string()],
            base_url: "https://api.example.com/v1".to_string(),
            access_key: None,
            default_model: None,
        }
    }

    #[test]
    fn accepts_lowercase_identifiers() {
        assert!(settings("my-pool_2").validate().is_ok());
    }

    #[test]
    fn rejects_uppercase_and_empty_names() {
        assert!(settings("MyPool").validate().is_err());
        assert!(settings("").validate().is_err());
    }

    #[test]
    fn rejects_empty_key_lists_and_blank_keys() {
        let mut s = settings("a");
        s.keys.clear();
        assert!(matches!(s.validate(), Err(ProviderConfigError::NoKeys(_))));
        let mut s = settings("a");
        s.keys.push("  ".to_string());
        assert!(matches!(s.validate(), Err(ProviderConfigError::EmptyKey(_))));
    }

    #[test]
    fn rejects_relative_base_urls() {
        let mut s = settings("a");
        s.base_url = "api.example.com/v1".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let list = vec![settings("a"), settings("a")];
        assert!(matches!(
            validate_providers(&list),
            Err(ProviderConfigError::DuplicateName(_))
        ));
    }
}
