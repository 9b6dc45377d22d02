//! Fixed demo fleet loaded by `POST /seed` (and by the device list when
//! the registry is empty).
//!
//! Four chambers exercising each status classification: a healthy ripening
//! run, a drifting homogenization run, a powered-off room, and an alarmed
//! room. Ids and sensor values match the pilot fleet so existing
//! dashboards render identically; process windows are laid out relative
//! to `now` so progress bars are alive on a fresh install.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Device, DeviceStatus, OperationalData, ProcessKind, TelemetryData};
use crate::process::ProcessState;

// ---

/// Build the demo fleet with process windows anchored at `now`.
pub fn demo_fleet(now: DateTime<Utc>) -> Vec<Device> {
    // ---
    vec![
        // Mid-run ripening chamber, on target
        Device {
            id: "ZGRU5140008".to_string(),
            name: "Ripening Room 01".to_string(),
            status: DeviceStatus::Active,
            telemetry: TelemetryData {
                temp_supply_1: 19.0,
                return_air: 19.5,
                relative_humidity: 97.0,
                ethylene: Some(120.0),
                co2_reading: Some(3.5),
                set_point: 19.0,
                state_process: ProcessKind::Ripening,
                power_state: 1,
                alarm_present: 0,
                ..Default::default()
            },
            operational: OperationalData {
                evaporation_coil: 19.3,
                condensation_coil: 20.5,
                ambient_air: 20.0,
                power_consumption: 0.01,
                power_kwh: 8062.4,
                battery_voltage: 41.8,
                defrost_interval: 6.0,
                fresh_air_ex_mode: 0.0,
            },
            process: Some(demo_process(
                "Kent Mango - Standard Ripening",
                ProcessKind::Ripening,
                now - Duration::hours(24),
                now + Duration::hours(48),
                "rec-mango-kent-eu",
            )),
        },
        // Early homogenization run, drifted humidity
        Device {
            id: "ZGRU5140009".to_string(),
            name: "Ripening Room 02".to_string(),
            status: DeviceStatus::Warning,
            telemetry: TelemetryData {
                temp_supply_1: 14.0,
                return_air: 14.8,
                relative_humidity: 82.0,
                ethylene: Some(10.0),
                co2_reading: Some(0.5),
                set_point: 14.0,
                state_process: ProcessKind::Homogenization,
                power_state: 1,
                alarm_present: 0,
                humidity_set_point: Some(90.0),
                ..Default::default()
            },
            operational: OperationalData {
                evaporation_coil: 14.1,
                condensation_coil: 15.2,
                ambient_air: 16.0,
                power_consumption: 0.02,
                power_kwh: 4030.1,
                battery_voltage: 41.5,
                defrost_interval: 6.0,
                fresh_air_ex_mode: 0.0,
            },
            process: Some(demo_process(
                "Hass Avocado - Pre-ripening",
                ProcessKind::Homogenization,
                now - Duration::hours(2),
                now + Duration::hours(6),
                "rec-palta-hass-local",
            )),
        },
        // Powered down, nothing loaded
        Device {
            id: "ZGRU5140010".to_string(),
            name: "Ripening Room 03".to_string(),
            status: DeviceStatus::Offline,
            telemetry: TelemetryData {
                ethylene: None,
                co2_reading: None,
                state_process: ProcessKind::None,
                power_state: 0,
                alarm_present: 0,
                ..Default::default()
            },
            operational: OperationalData {
                ambient_air: 24.0,
                power_kwh: 12050.5,
                defrost_interval: 6.0,
                ..Default::default()
            },
            process: None,
        },
        // Over temperature with the alarm relay latched
        Device {
            id: "ZGRU5140011".to_string(),
            name: "Ripening Room 04".to_string(),
            status: DeviceStatus::Alarm,
            telemetry: TelemetryData {
                temp_supply_1: 22.0,
                return_air: 23.0,
                relative_humidity: 99.0,
                ethylene: Some(200.0),
                co2_reading: Some(6.0),
                set_point: 18.0,
                state_process: ProcessKind::Ripening,
                power_state: 1,
                alarm_present: 1,
                ..Default::default()
            },
            operational: OperationalData {
                evaporation_coil: 21.5,
                condensation_coil: 25.0,
                ambient_air: 22.0,
                power_consumption: 0.05,
                power_kwh: 500.2,
                battery_voltage: 41.2,
                defrost_interval: 4.0,
                fresh_air_ex_mode: 1.0,
            },
            process: Some(demo_process(
                "Banana - Fast Cycle",
                ProcessKind::Ripening,
                now - Duration::hours(40),
                now + Duration::hours(10),
                "rec-banano-org-piura",
            )),
        },
    ]
}

fn demo_process(
    name: &str,
    phase: ProcessKind,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    recipe_id: &str,
) -> ProcessState {
    // ---
    let mut process = ProcessState {
        name: name.to_string(),
        progress: 0,
        start_time: start,
        end_time: end,
        current_phase: format!("{phase:?}"),
        time_left: String::new(),
        recipe_id: Some(recipe_id.to_string()),
    };
    process.refresh(start.max(end.min(Utc::now())));
    process
}
