//! Config validation
//!
//! Rules:
//! - field ranges from the `validator` derives (channel size, worker count, drain timeout)
//! - sink names non-empty and unique
//! - enabled syslog sinks carry a well-formed endpoint
//!
//! Softer findings (a list mode without its list file, nothing enabled)
//! are reported by [`warnings`] and never fail loading.

use std::collections::HashSet;

use contracts::{ContractError, OutputBlueprint, SinkConfig, SinkKind, SyslogEndpoint};
use validator::Validate;

/// Validate an OutputBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &OutputBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_sink_names(blueprint)?;
    validate_endpoints(blueprint)?;
    Ok(())
}

/// Non-fatal findings, one message per finding
pub fn warnings(blueprint: &OutputBlueprint) -> Vec<String> {
    let general = &blueprint.general;
    let mut found = Vec::new();

    for sink in &blueprint.sinks {
        if sink.mode.uses_skip_list() && general.skip_domains_file.is_none() {
            found.push(format!(
                "sink '{}' uses mode {} but no skip_domains_file is set; nothing will be skipped",
                sink.name, sink.mode
            ));
        }
        if sink.mode.uses_allow_list() && general.allow_domains_file.is_none() {
            found.push(format!(
                "sink '{}' uses mode {} but no allow_domains_file is set; every query will be skipped",
                sink.name, sink.mode
            ));
        }
    }

    if !blueprint.sinks.iter().any(|s| s.mode.is_enabled()) {
        found.push("no sink is enabled; the dispatcher will refuse to start".to_string());
    }

    found
}

/// Range rules declared on the contract types
fn validate_fields(blueprint: &OutputBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// Sink names must be non-empty and unique
fn validate_sink_names(blueprint: &OutputBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

/// Enabled syslog sinks need `scheme://address`
fn validate_endpoints(blueprint: &OutputBlueprint) -> Result<(), ContractError> {
    for sink in &blueprint.sinks {
        if sink.kind == SinkKind::Syslog && sink.mode.is_enabled() {
            check_endpoint(sink)?;
        }
    }
    Ok(())
}

fn check_endpoint(sink: &SinkConfig) -> Result<(), ContractError> {
    let field = format!("sinks[{}].endpoint", sink.name);
    let endpoint = sink
        .endpoint
        .as_deref()
        .ok_or_else(|| ContractError::config_validation(&field, "syslog sink requires an endpoint"))?;

    endpoint
        .parse::<SyslogEndpoint>()
        .map(|_| ())
        .map_err(|e| ContractError::config_validation(&field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, FilterMode, GeneralConfig, OutputFormat};
    use std::path::PathBuf;

    fn minimal_blueprint() -> OutputBlueprint {
        OutputBlueprint {
            version: ConfigVersion::V1,
            general: GeneralConfig {
                skip_domains_file: Some(PathBuf::from("skip.txt")),
                ..Default::default()
            },
            sinks: vec![
                SinkConfig::console("stdout", FilterMode::SkipListOnly, OutputFormat::Json),
                SinkConfig::syslog("collector", FilterMode::NoFilter, "tcp://10.0.0.5:601"),
            ],
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
        assert!(warnings(&bp).is_empty());
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[1].name = "stdout".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_zero_workers() {
        let mut bp = minimal_blueprint();
        bp.sinks[0].worker_count = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("worker_count"), "got: {err}");
    }

    #[test]
    fn test_zero_channel_size() {
        let mut bp = minimal_blueprint();
        bp.general.result_channel_size = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("result_channel_size"), "got: {err}");
    }

    #[test]
    fn test_bad_endpoints() {
        for endpoint in ["10.0.0.5:514", "http://10.0.0.5:80", "udp://10.0.0.5", "unix://"] {
            let mut bp = minimal_blueprint();
            bp.sinks[1].endpoint = Some(endpoint.into());
            assert!(validate(&bp).is_err(), "accepted {endpoint}");
        }

        let mut bp = minimal_blueprint();
        bp.sinks[1].endpoint = None;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("requires an endpoint"), "got: {err}");
    }

    #[test]
    fn test_endpoint_error_matches_endpoint_parser() {
        let mut bp = minimal_blueprint();
        bp.sinks[1].endpoint = Some("udp://10.0.0.5".into());
        let err = validate(&bp).unwrap_err().to_string();
        let parser_err = "udp://10.0.0.5".parse::<SyslogEndpoint>().unwrap_err().to_string();
        assert!(err.contains(&parser_err), "got: {err}");
    }

    #[test]
    fn test_zero_retry_interval_rejected() {
        let mut bp = minimal_blueprint();
        bp.sinks[1].retry_interval_secs = Some(0);
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("retry_interval_secs"), "got: {err}");
    }

    #[test]
    fn test_disabled_syslog_endpoint_not_checked() {
        let mut bp = minimal_blueprint();
        bp.sinks[1].mode = FilterMode::Disabled;
        bp.sinks[1].endpoint = None;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_unix_endpoint_accepted() {
        let mut bp = minimal_blueprint();
        bp.sinks[1].endpoint = Some("unix:///dev/log".into());
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_warnings_for_missing_lists() {
        let mut bp = minimal_blueprint();
        bp.general.skip_domains_file = None;
        bp.sinks[1].mode = FilterMode::AllowListOnly;

        let found = warnings(&bp);
        assert_eq!(found.len(), 2, "got: {found:?}");
        assert!(found[0].contains("skip_domains_file"));
        assert!(found[1].contains("allow_domains_file"));
    }

    #[test]
    fn test_warning_when_nothing_enabled() {
        let mut bp = minimal_blueprint();
        for sink in &mut bp.sinks {
            sink.mode = FilterMode::Disabled;
        }
        let found = warnings(&bp);
        assert!(found.iter().any(|w| w.contains("no sink is enabled")));
    }
}
