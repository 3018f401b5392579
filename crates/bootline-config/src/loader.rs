//! Settings loader.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::error::ConfigError;

/// Supported settings file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Toml,
    Json,
    Yaml,
}

impl SettingsFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Settings loader with environment variable substitution.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Value, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let format = SettingsFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;
        Self::load_str(&content, format)
    }

    /// Load settings from a string.
    ///
    /// An empty document yields `{}`. Anything other than a table at the top
    /// level is rejected.
    pub fn load_str(content: &str, format: SettingsFormat) -> Result<Value, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        let expanded = Self::expand_env_vars(content)?;
        let value: Value = match format {
            SettingsFormat::Toml => toml::from_str(&expanded)?,
            SettingsFormat::Json => serde_json::from_str(&expanded)?,
            SettingsFormat::Yaml => serde_yml::from_str(&expanded)?,
        };

        match value {
            Value::Object(_) => Ok(value),
            Value::Null => Ok(Value::Object(Default::default())),
            other => Err(ConfigError::InvalidFormat(format!(
                "expected a table at the top level, got {}",
                other
            ))),
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_empty_settings() {
        let settings = SettingsLoader::load_str("", SettingsFormat::Toml).unwrap();
        assert_eq!(settings, json!({}));
    }

    #[test]
    fn test_load_toml() {
        let content = r#"
            increment = 1

            [http]
            port = 8080
        "#;
        let settings = SettingsLoader::load_str(content, SettingsFormat::Toml).unwrap();
        assert_eq!(settings, json!({"increment": 1, "http": {"port": 8080}}));
    }

    #[test]
    fn test_load_yaml() {
        let content = "http:\n  port: 8080\nfeatures:\n  - a\n  - b\n";
        let settings = SettingsLoader::load_str(content, SettingsFormat::Yaml).unwrap();
        assert_eq!(settings["http"]["port"], json!(8080));
        assert_eq!(settings["features"][1], json!("b"));
    }

    #[test]
    fn test_load_json() {
        let settings =
            SettingsLoader::load_str(r#"{"foo": {"faa": 22}}"#, SettingsFormat::Json).unwrap();
        assert_eq!(settings["foo"]["faa"], json!(22));
    }

    #[test]
    fn test_top_level_must_be_a_table() {
        let result = SettingsLoader::load_str("[1, 2]", SettingsFormat::Json);
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_load_from_file() {
        let file = write_temp(".toml", "[http]\nport = 5000\n");
        let settings = SettingsLoader::load(file.path()).unwrap();
        assert_eq!(settings["http"]["port"], json!(5000));
    }

    #[test]
    fn test_load_yml_extension() {
        let file = write_temp(".yml", "foo: 1\n");
        let settings = SettingsLoader::load(file.path()).unwrap();
        assert_eq!(settings, json!({"foo": 1}));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SettingsLoader::load(Path::new("/nonexistent/path/settings.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".ini", "foo=1");
        let result = SettingsLoader::load(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = SettingsLoader::load_str("invalid = [unclosed", SettingsFormat::Toml);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("BOOTLINE_TEST_SETTINGS_VAR", "test_value");
        }
        let content = "value = \"${BOOTLINE_TEST_SETTINGS_VAR}\"";
        let settings = SettingsLoader::load_str(content, SettingsFormat::Toml).unwrap();
        assert_eq!(settings["value"], json!("test_value"));
        unsafe {
            std::env::remove_var("BOOTLINE_TEST_SETTINGS_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_BOOTLINE_VAR_12345}\"";
        let result = SettingsLoader::load_str(content, SettingsFormat::Toml);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(ref name)) if name == "NONEXISTENT_BOOTLINE_VAR_12345"));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = SettingsLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/usr/local/etc";
        assert_eq!(SettingsLoader::expand_path(path), path);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = SettingsLoader::expand_path("~/settings.toml");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/settings.toml"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SettingsFormat::from_path(Path::new("a.TOML")).unwrap(), SettingsFormat::Toml);
        assert_eq!(SettingsFormat::from_path(Path::new("a.yaml")).unwrap(), SettingsFormat::Yaml);
        assert!(SettingsFormat::from_path(Path::new("settings")).is_err());
    }
}
