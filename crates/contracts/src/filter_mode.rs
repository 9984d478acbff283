//! Per-sink output mode and encoding

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContractError;

/// Which domain lists a sink consults before emitting a query
///
/// The numeric values match the operator-facing flag values (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Sink is not configured and will be pruned at startup
    #[default]
    Disabled,
    /// Emit everything
    NoFilter,
    /// Drop names on the skip list
    SkipListOnly,
    /// Emit only names on the allow list
    AllowListOnly,
    /// Drop skip-listed names unless they are also allow-listed
    SkipAndAllow,
}

impl FilterMode {
    /// Whether the sink should be kept in the registry
    pub fn is_enabled(self) -> bool {
        self != Self::Disabled
    }

    /// Whether the skip list is consulted
    pub fn uses_skip_list(self) -> bool {
        matches!(self, Self::SkipListOnly | Self::SkipAndAllow)
    }

    /// Whether the allow list is consulted
    pub fn uses_allow_list(self) -> bool {
        matches!(self, Self::AllowListOnly | Self::SkipAndAllow)
    }
}

impl TryFrom<u8> for FilterMode {
    type Error = ContractError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::NoFilter),
            2 => Ok(Self::SkipListOnly),
            3 => Ok(Self::AllowListOnly),
            4 => Ok(Self::SkipAndAllow),
            other => Err(ContractError::config_validation(
                "mode",
                format!("filter mode must be within 0..=4, got {other}"),
            )),
        }
    }
}

impl From<FilterMode> for u8 {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Disabled => 0,
            FilterMode::NoFilter => 1,
            FilterMode::SkipListOnly => 2,
            FilterMode::AllowListOnly => 3,
            FilterMode::SkipAndAllow => 4,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::NoFilter => "no_filter",
            Self::SkipListOnly => "skip_list_only",
            Self::AllowListOnly => "allow_list_only",
            Self::SkipAndAllow => "skip_and_allow",
        };
        f.write_str(name)
    }
}

/// Line encoding used by text sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One JSON document per line
    #[default]
    Json,
    /// Comma separated row, preceded by a header row
    Csv,
}
