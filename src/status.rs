//! Device health classification.
//!
//! A pure function over the merged telemetry, evaluated in strict priority
//! order: alarm beats offline beats warning beats active.

use crate::models::{DeviceStatus, ProcessKind, TelemetryData};

// ---

/// Supply-air drift from `set_point` that demotes a running chamber to
/// `warning`.
pub const TEMP_TOLERANCE_C: f64 = 2.0;

/// Relative-humidity drift from `humidity_set_point` (when configured)
/// that demotes a running chamber to `warning`.
pub const HUMIDITY_TOLERANCE_PCT: f64 = 5.0;

/// Classify a chamber from its merged telemetry.
///
/// Priority order:
/// 1. `alarm_present == 1` → `alarm`, regardless of anything else
/// 2. no loaded process or powered off → `offline`
/// 3. outside the temperature or humidity tolerance band → `warning`
/// 4. otherwise → `active`
pub fn derive_status(telemetry: &TelemetryData) -> DeviceStatus {
    // ---
    if telemetry.alarm_present == 1 {
        return DeviceStatus::Alarm;
    }

    if telemetry.state_process == ProcessKind::None || telemetry.power_state == 0 {
        return DeviceStatus::Offline;
    }

    if (telemetry.temp_supply_1 - telemetry.set_point).abs() > TEMP_TOLERANCE_C {
        return DeviceStatus::Warning;
    }
    if let Some(target) = telemetry.humidity_set_point {
        if (telemetry.relative_humidity - target).abs() > HUMIDITY_TOLERANCE_PCT {
            return DeviceStatus::Warning;
        }
    }

    DeviceStatus::Active
}
