//! Operator control commands.
//!
//! The wire contract is `{action: string, params: object}`; the raw shape
//! is parsed into a tagged [`ControlCommand`] with strongly-typed payloads
//! and validated before it ever reaches the registry. Unknown actions and
//! malformed params are rejected as `InvalidPayload`.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::ProcessKind;

// ---

/// Longest accepted process duration, in hours (one year). Anything
/// beyond this would overflow the process window arithmetic.
pub const MAX_DURATION_HOURS: f64 = 8760.0;

/// Raw control request as posted to `POST /devices/{id}/control`.
#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    // ---
    pub action: String,
    #[serde(default)]
    pub params: Value,
}

/// A validated operator command, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Start a treatment process on the device.
    SetProcess(SetProcessParams),
    /// Clear the active process, acknowledging completion or aborting.
    StopProcess,
    /// Patch individual setpoints without touching process state.
    ManualUpdate(ManualUpdateParams),
}

/// Payload of `set_process`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProcessParams {
    // ---
    #[serde(rename = "type")]
    pub kind: ProcessKind,
    pub name: String,
    pub duration_hours: f64,
    #[serde(default)]
    pub set_point: Option<f64>,
    #[serde(default)]
    pub ethylene: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub recipe_id: Option<String>,
}

/// Payload of `manual_update`. Only the supplied fields are patched.
///
/// Field names are snake_case on the wire, unlike `set_process` — the
/// operator panels address the same names telemetry reports.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ManualUpdateParams {
    // ---
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub set_point: Option<f64>,
    #[serde(default)]
    pub power_state: Option<u8>,
    #[serde(default)]
    pub ethylene: Option<f64>,
    #[serde(default)]
    pub humidity_set_point: Option<f64>,
    #[serde(default)]
    pub fan_speed: Option<f64>,
}

impl ControlRequest {
    // ---

    /// Parse and validate the request into a typed command.
    pub fn into_command(self) -> Result<ControlCommand, CoreError> {
        // ---
        match self.action.as_str() {
            "set_process" => {
                let params: SetProcessParams = serde_json::from_value(self.params)
                    .map_err(|e| CoreError::invalid(format!("set_process params: {e}")))?;
                if params.kind == ProcessKind::None {
                    return Err(CoreError::invalid(
                        "set_process type must name a process, not 'None'",
                    ));
                }
                if !params.duration_hours.is_finite() || params.duration_hours <= 0.0 {
                    return Err(CoreError::invalid("durationHours must be positive"));
                }
                if params.duration_hours > MAX_DURATION_HOURS {
                    return Err(CoreError::invalid(format!(
                        "durationHours must not exceed {MAX_DURATION_HOURS}"
                    )));
                }
                Ok(ControlCommand::SetProcess(params))
            }
            "stop_process" => Ok(ControlCommand::StopProcess),
            "manual_update" => {
                let params: ManualUpdateParams = serde_json::from_value(self.params)
                    .map_err(|e| CoreError::invalid(format!("manual_update params: {e}")))?;
                if let Some(power) = params.power_state {
                    if power > 1 {
                        return Err(CoreError::invalid("power_state must be 0 or 1"));
                    }
                }
                Ok(ControlCommand::ManualUpdate(params))
            }
            other => Err(CoreError::invalid(format!("unknown action '{other}'"))),
        }
    }
}
