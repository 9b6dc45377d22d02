//! Device aggregate and telemetry models for the chamber fleet.
//!
//! Wire shapes mirror what the field controllers and dashboards already
//! speak: snake_case sensor fields with a legacy camelCase `stateProcess`
//! discriminator, and 0/1 integer flags for power and alarm state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::process::ProcessState;

// ---

/// Health classification of a chamber, derived on every ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Warning,
    Alarm,
    Offline,
}

/// Treatment mode a chamber reports (and is commanded into).
///
/// `None` means no process is loaded; the registry keeps this in lockstep
/// with the presence of the device's `process` record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    #[default]
    None,
    Homogenization,
    Ripening,
    Ventilation,
    Cooling,
    Integral,
}

/// One controlled-atmosphere chamber as tracked by the registry.
///
/// Owned exclusively by the registry: mutation happens only through
/// telemetry ingestion and control dispatch, never deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    // ---
    pub id: String,
    pub name: String,
    pub status: DeviceStatus,
    pub telemetry: TelemetryData,
    pub operational: OperationalData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessState>,
}

/// Latest reported sensor/state snapshot for a chamber.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryData {
    // ---
    pub temp_supply_1: f64,
    pub return_air: f64,
    pub relative_humidity: f64,
    pub ethylene: Option<f64>,
    pub co2_reading: Option<f64>,
    pub set_point: f64,
    #[serde(rename = "stateProcess")]
    pub state_process: ProcessKind,
    pub power_state: u8,
    pub alarm_present: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Operator-set humidity target; absent until first `manual_update`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_set_point: Option<f64>,
    /// Operator-set fan speed; absent until first `manual_update`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<f64>,
}

/// Deserialize a present-but-possibly-null field into `Some(inner)`.
///
/// Combined with `#[serde(default)]` this distinguishes a field missing
/// from the report (outer `None`, retain stored value) from an explicit
/// JSON null (inner `None`, clear the reading).
fn nullable_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial telemetry as posted by a reporting chamber.
///
/// Merge is a shallow field overwrite: unsupplied fields keep their stored
/// values. The two gas readings are nullable on the wire, so they carry
/// double-option semantics (see [`nullable_field`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryPatch {
    // ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_supply_1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_air: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity: Option<f64>,
    #[serde(
        default,
        deserialize_with = "nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethylene: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub co2_reading: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_point: Option<f64>,
    #[serde(
        default,
        rename = "stateProcess",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_process: Option<ProcessKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_present: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_set_point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<f64>,
}

impl TelemetryPatch {
    // ---

    /// Fold this patch into `telemetry`, overwriting only supplied fields.
    pub fn apply(&self, telemetry: &mut TelemetryData) {
        // ---
        if let Some(v) = self.temp_supply_1 {
            telemetry.temp_supply_1 = v;
        }
        if let Some(v) = self.return_air {
            telemetry.return_air = v;
        }
        if let Some(v) = self.relative_humidity {
            telemetry.relative_humidity = v;
        }
        if let Some(v) = &self.ethylene {
            telemetry.ethylene = *v;
        }
        if let Some(v) = &self.co2_reading {
            telemetry.co2_reading = *v;
        }
        if let Some(v) = self.set_point {
            telemetry.set_point = v;
        }
        if let Some(v) = self.state_process {
            telemetry.state_process = v;
        }
        if let Some(v) = self.power_state {
            telemetry.power_state = v;
        }
        if let Some(v) = self.alarm_present {
            telemetry.alarm_present = v;
        }
        if let Some(v) = self.humidity_set_point {
            telemetry.humidity_set_point = Some(v);
        }
        if let Some(v) = self.fan_speed {
            telemetry.fan_speed = Some(v);
        }
    }
}

/// Derived/metered counters reported alongside telemetry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationalData {
    // ---
    pub evaporation_coil: f64,
    pub condensation_coil: f64,
    pub ambient_air: f64,
    pub power_consumption: f64,
    /// Cumulative energy meter; never decreases across merges.
    pub power_kwh: f64,
    pub battery_voltage: f64,
    pub defrost_interval: f64,
    pub fresh_air_ex_mode: f64,
}

/// Partial operational counters as posted by a reporting chamber.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationalPatch {
    // ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaporation_coil: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condensation_coil: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_air: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_kwh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defrost_interval: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fresh_air_ex_mode: Option<f64>,
}

impl OperationalPatch {
    // ---

    /// Fold this patch into `operational`. The cumulative `power_kwh`
    /// meter is clamped so a stale or reset report can never roll it back.
    pub fn apply(&self, operational: &mut OperationalData) {
        // ---
        if let Some(v) = self.evaporation_coil {
            operational.evaporation_coil = v;
        }
        if let Some(v) = self.condensation_coil {
            operational.condensation_coil = v;
        }
        if let Some(v) = self.ambient_air {
            operational.ambient_air = v;
        }
        if let Some(v) = self.power_consumption {
            operational.power_consumption = v;
        }
        if let Some(v) = self.power_kwh {
            operational.power_kwh = operational.power_kwh.max(v);
        }
        if let Some(v) = self.battery_voltage {
            operational.battery_voltage = v;
        }
        if let Some(v) = self.defrost_interval {
            operational.defrost_interval = v;
        }
        if let Some(v) = self.fresh_air_ex_mode {
            operational.fresh_air_ex_mode = v;
        }
    }
}
