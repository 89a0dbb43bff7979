use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};

const TELEMETRY_TARGET: &str = "rulegraph::events::telemetry";

pub const CMD_LOAD_RULESET: &str = "LoadRuleset";
pub const CMD_REFRESH_CATALOG: &str = "RefreshCatalog";
pub const CMD_RECOMPUTE_GRAPH: &str = "RecomputeGraph";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandLifecycle {
    Start,
    Success,
    Failure,
    Superseded,
}

impl fmt::Display for CommandLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "command_start"),
            Self::Success => write!(f, "command_success"),
            Self::Failure => write!(f, "command_failure"),
            Self::Superseded => write!(f, "command_superseded"),
        }
    }
}

/// One lifecycle step of a command, correlated by its request number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTelemetry {
    pub request: u64,
    pub command: String,
    pub lifecycle: CommandLifecycle,
    pub error_reason: Option<String>,
    pub duration_ms: Option<u128>,
}

impl CommandTelemetry {
    fn new(command: impl Into<String>, request: u64, lifecycle: CommandLifecycle) -> Self {
        Self {
            request,
            command: command.into(),
            lifecycle,
            error_reason: None,
            duration_ms: None,
        }
    }

    fn now_unix_ms() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }
}

pub fn command_start(command: &str, request: u64) -> CommandTelemetry {
    let telemetry = CommandTelemetry::new(command, request, CommandLifecycle::Start);
    info!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        request = telemetry.request,
        lifecycle = %telemetry.lifecycle,
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_start"
    );
    telemetry
}

pub fn command_success(command: &str, request: u64, duration_ms: Option<u128>) -> CommandTelemetry {
    let mut telemetry = CommandTelemetry::new(command, request, CommandLifecycle::Success);
    telemetry.duration_ms = duration_ms;
    info!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        request = telemetry.request,
        lifecycle = %telemetry.lifecycle,
        duration_ms = ?telemetry.duration_ms,
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_success"
    );
    telemetry
}

pub fn command_failure(command: &str, request: u64, reason: Option<String>) -> CommandTelemetry {
    let mut telemetry = CommandTelemetry::new(command, request, CommandLifecycle::Failure);
    telemetry.error_reason = reason;
    let error_reason = telemetry.error_reason.as_deref().unwrap_or("unclassified");

    error!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        request = telemetry.request,
        lifecycle = %telemetry.lifecycle,
        error = %error_reason,
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_failure"
    );

    telemetry
}

/// A response for `request` arrived after `latest` was issued.
pub fn command_superseded(command: &str, request: u64, latest: u64) -> CommandTelemetry {
    let telemetry = CommandTelemetry::new(command, request, CommandLifecycle::Superseded);
    debug!(
        target: TELEMETRY_TARGET,
        command = %telemetry.command,
        request = telemetry.request,
        latest,
        lifecycle = %telemetry.lifecycle,
        timestamp_ms = CommandTelemetry::now_unix_ms(),
        "command_superseded"
    );
    telemetry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_telemetry_lifecycle() {
        let start = command_start(CMD_LOAD_RULESET, 7);
        let success = command_success(CMD_LOAD_RULESET, 7, Some(12));
        let failure = command_failure(CMD_REFRESH_CATALOG, 8, Some("timeout".to_string()));
        let stale = command_superseded(CMD_LOAD_RULESET, 6, 7);

        assert_eq!(start.lifecycle, CommandLifecycle::Start);
        assert!(start.duration_ms.is_none());
        assert_eq!(success.lifecycle, CommandLifecycle::Success);
        assert_eq!(success.duration_ms, Some(12));
        assert_eq!(failure.lifecycle, CommandLifecycle::Failure);
        assert_eq!(failure.error_reason, Some("timeout".to_string()));
        assert_eq!(stale.lifecycle, CommandLifecycle::Superseded);
        assert_eq!(stale.request, 6);
    }

    #[test]
    fn lifecycle_display_names() {
        assert_eq!(CommandLifecycle::Start.to_string(), "command_start");
        assert_eq!(CommandLifecycle::Superseded.to_string(), "command_superseded");
    }
}
