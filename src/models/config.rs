//! Configuration model loaded from external sources.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::domain::types::{PageSize, TypeConstraintError};
use crate::dto::export::ExportColumn;
use crate::services::controller::ControllerSettings;
use crate::services::debounce::DEFAULT_SEARCH_DEBOUNCE;

fn default_list_path() -> String {
    "/api/leads".to_string()
}

fn default_mutation_path() -> String {
    "/api/leads/{id}".to_string()
}

fn default_export_path() -> String {
    "/api/leads/export".to_string()
}

fn default_search_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64
}

fn default_page_size() -> u32 {
    20
}

fn default_page_sizes() -> Vec<u32> {
    vec![10, 20, 50, 100]
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize, Validate)]
/// Settings of one list view client.
pub struct ClientConfig {
    /// Origin of the admin API, e.g. `https://admin.example.com`.
    #[validate(url)]
    pub base_url: String,
    #[serde(default = "default_list_path")]
    #[validate(length(min = 1))]
    pub list_path: String,
    /// Route of a single record; `{id}` is replaced by the record id.
    #[serde(default = "default_mutation_path")]
    #[validate(contains(pattern = "{id}"))]
    pub mutation_path: String,
    #[serde(default = "default_export_path")]
    #[validate(length(min = 1))]
    pub export_path: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1))]
    pub default_page_size: u32,
    #[serde(default = "default_page_sizes")]
    #[validate(length(min = 1))]
    pub page_sizes: Vec<u32>,
    /// Restore the previous value when the server rejects an edit.
    #[serde(default)]
    pub rollback_on_failure: bool,
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    /// Columns of exported files, in order. Empty exports every field.
    #[serde(default)]
    pub export_columns: Vec<ExportColumn>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            list_path: default_list_path(),
            mutation_path: default_mutation_path(),
            export_path: default_export_path(),
            auth_token: None,
            search_debounce_ms: default_search_debounce_ms(),
            default_page_size: default_page_size(),
            page_sizes: default_page_sizes(),
            rollback_on_failure: false,
            request_timeout_secs: default_request_timeout_secs(),
            export_columns: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Controller settings derived from this configuration.
    pub fn controller_settings(&self) -> Result<ControllerSettings, TypeConstraintError> {
        let page_sizes = self
            .page_sizes
            .iter()
            .map(|size| PageSize::new(*size))
            .collect::<Result<Vec<_>, _>>()?;
        let page_size = PageSize::from_choices(self.default_page_size, &page_sizes)?;

        Ok(ControllerSettings {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            page_size,
            page_sizes,
            rollback_on_failure: self.rollback_on_failure,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Loads `config/default.yaml`, the optional `config/{profile}.yaml` and
/// `LEADS__*` environment overrides, in that order.
pub fn load_config(profile: &str) -> Result<ClientConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{profile}")).required(false))
        .add_source(Environment::with_prefix("LEADS").separator("__"))
        .build()?;

    let config: ClientConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Loads settings from a single YAML file without environment overrides.
pub fn load_config_file(path: &std::path::Path) -> Result<ClientConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::from(path).format(config::FileFormat::Yaml))
        .build()?;

    let config: ClientConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("yaml written");
        file
    }

    #[test]
    fn fills_defaults_from_minimal_file() {
        let file = write_yaml("base_url: https://admin.example.com\n");
        let config = load_config_file(file.path()).expect("valid config");

        assert_eq!(config.list_path, "/api/leads");
        assert_eq!(config.search_debounce_ms, 450);
        assert_eq!(config.page_sizes, vec![10, 20, 50, 100]);
        assert!(!config.rollback_on_failure);

        let settings = config.controller_settings().expect("valid settings");
        assert_eq!(settings.page_size.get(), 20);
        assert_eq!(settings.search_debounce, Duration::from_millis(450));
    }

    #[test]
    fn reads_export_columns_in_order() {
        let file = write_yaml(
            "base_url: https://admin.example.com\n\
             export_columns:\n  - {key: name, header: Name}\n  - {key: status, header: Status}\n",
        );
        let config = load_config_file(file.path()).expect("valid config");

        assert_eq!(
            config.export_columns,
            vec![
                ExportColumn::new("name", "Name"),
                ExportColumn::new("status", "Status")
            ]
        );
    }

    #[test]
    fn rejects_mutation_path_without_id() {
        let file = write_yaml(
            "base_url: https://admin.example.com\nmutation_path: /api/leads/update\n",
        );
        assert!(matches!(
            load_config_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn default_page_size_must_be_a_choice() {
        let config = ClientConfig {
            default_page_size: 25,
            ..ClientConfig::default()
        };
        assert_eq!(
            config.controller_settings().err(),
            Some(TypeConstraintError::PageSizeNotAllowed(25))
        );
    }
}
