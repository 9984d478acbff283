//! Config parsing
//!
//! TOML (primary) and JSON.

use contracts::{ContractError, OutputBlueprint};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (preferred)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML config
pub fn parse_toml(content: &str) -> Result<OutputBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON config
pub fn parse_json(content: &str) -> Result<OutputBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse config in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<OutputBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FilterMode, OutputFormat, SinkKind};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[general]
server_name = "edge-01"
skip_domains_file = "/etc/dnsfanout/skip.txt"

[[sinks]]
name = "stdout"
kind = "console"
mode = "skip_list_only"
format = "csv"

[[sinks]]
name = "collector"
kind = "syslog"
mode = "no_filter"
endpoint = "udp://10.0.0.5:514"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.general.server_name, "edge-01");
        assert_eq!(bp.general.result_channel_size, 100_000);
        assert_eq!(bp.sinks.len(), 2);
        assert_eq!(bp.sinks[0].mode, FilterMode::SkipListOnly);
        assert_eq!(bp.sinks[0].format, OutputFormat::Csv);
        assert_eq!(bp.sinks[1].kind, SinkKind::Syslog);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "general": { "result_channel_size": 512 },
            "sinks": [{ "name": "stdout", "kind": "console", "mode": "no_filter" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        assert_eq!(result.unwrap().general.result_channel_size, 512);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let content = r#"
[[sinks]]
name = "stdout"
kind = "console"
mode = "sometimes"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
