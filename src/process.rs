//! Treatment-process orchestration.
//!
//! A device holds at most one active process. The record fixes `startTime`
//! and `endTime` at creation; `progress` and `timeLeft` are always derived
//! from the current wall clock against those bounds, never ticked — so a
//! refresh is idempotent and safe for concurrent readers. Reaching 100%
//! keeps the record in place (dashboards show the finished run) until an
//! operator issues `stop_process`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Device, ProcessKind};

// ---

/// One timed execution of a treatment against a device.
///
/// Serialized with the camelCase field names the fleet dashboards expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessState {
    // ---
    pub name: String,
    /// Integer percentage, 0–100, non-decreasing while the process runs.
    pub progress: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub current_phase: String,
    pub time_left: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
}

impl ProcessState {
    // ---

    /// Create a running process starting at `now` and ending
    /// `duration_hours` later.
    pub fn start(
        name: impl Into<String>,
        phase: ProcessKind,
        duration_hours: f64,
        recipe_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        // ---
        let total = Duration::milliseconds((duration_hours * 3_600_000.0) as i64);
        ProcessState {
            name: name.into(),
            progress: 0,
            start_time: now,
            end_time: now + total,
            current_phase: format!("{phase:?}"),
            time_left: format_time_left(total),
            recipe_id,
        }
    }

    /// Recompute `progress` and `time_left` from the wall clock.
    ///
    /// Past `end_time` the record pins at 100 / `"0h 00min"`. Progress is
    /// clamped against its stored value so a backwards clock step can never
    /// make it retreat.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        // ---
        let total = self.end_time - self.start_time;
        let elapsed = now - self.start_time;

        if elapsed >= total {
            self.progress = 100;
            self.time_left = "0h 00min".to_string();
            return;
        }

        let fraction = (elapsed.num_milliseconds() as f64 / total.num_milliseconds() as f64)
            .clamp(0.0, 1.0);
        self.progress = self.progress.max((fraction * 100.0).round() as u8);
        self.time_left = format_time_left(total - elapsed);
    }

    /// Whether the process has run past its end time.
    pub fn is_completed(&self) -> bool {
        self.progress == 100
    }
}

/// Format a remaining duration as `"{h}h {mm}min"`, flooring to whole
/// hours and whole minutes.
fn format_time_left(left: Duration) -> String {
    // ---
    let hours = left.num_hours();
    let minutes = left.num_minutes() % 60;
    format!("{hours}h {minutes:02}min")
}

/// Process lifecycle on the device aggregate.
impl Device {
    // ---

    /// Load and start a process: the Idle → Running transition.
    ///
    /// Sets `stateProcess` to the process type, applies the optional
    /// setpoint, and forces the chamber on.
    pub fn start_process(
        &mut self,
        name: impl Into<String>,
        phase: ProcessKind,
        duration_hours: f64,
        set_point: Option<f64>,
        recipe_id: Option<String>,
        now: DateTime<Utc>,
    ) {
        // ---
        self.telemetry.state_process = phase;
        self.process = Some(ProcessState::start(name, phase, duration_hours, recipe_id, now));
        if let Some(sp) = set_point {
            self.telemetry.set_point = sp;
        }
        self.telemetry.power_state = 1;
    }

    /// Clear the active process: Running|Completed → Idle.
    ///
    /// Resets `stateProcess` to `None` but leaves the power state and
    /// setpoint as the operator last left them. Idempotent: a no-op on an
    /// already-idle device.
    pub fn stop_process(&mut self) {
        // ---
        self.process = None;
        self.telemetry.state_process = ProcessKind::None;
    }

    /// Refresh the active process's derived fields, if one exists.
    pub fn refresh_progress(&mut self, now: DateTime<Utc>) {
        // ---
        if let Some(process) = &mut self.process {
            process.refresh(now);
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{DeviceStatus, OperationalData, TelemetryData};
    use chrono::TimeZone;

    fn create_test_device() -> Device {
        // ---
        Device {
            id: "ZGRU5140008".to_string(),
            name: "Ripening Room 01".to_string(),
            status: DeviceStatus::Active,
            telemetry: TelemetryData::default(),
            operational: OperationalData::default(),
            process: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn start_fixes_bounds_and_zeroes_progress() {
        // ---
        let p = ProcessState::start("Ripening Run", ProcessKind::Ripening, 72.0, None, t0());

        assert_eq!(p.progress, 0);
        assert_eq!(p.start_time, t0());
        assert_eq!(p.end_time, t0() + Duration::hours(72));
        assert_eq!(p.current_phase, "Ripening");
        assert_eq!(p.time_left, "72h 00min");
    }

    #[test]
    fn halfway_reads_fifty_percent() {
        // ---
        let mut p = ProcessState::start("Ripening Run", ProcessKind::Ripening, 72.0, None, t0());
        p.refresh(t0() + Duration::hours(36));

        assert_eq!(p.progress, 50);
        assert_eq!(p.time_left, "36h 00min");
    }

    #[test]
    fn progress_is_non_decreasing_in_elapsed_time() {
        // ---
        let mut p = ProcessState::start("Run", ProcessKind::Cooling, 10.0, None, t0());

        let mut last = 0;
        for minutes in (0..600).step_by(7) {
            p.refresh(t0() + Duration::minutes(minutes));
            assert!(p.progress >= last, "progress retreated at {minutes}min");
            assert!(p.progress <= 100);
            last = p.progress;
        }
    }

    #[test]
    fn completion_pins_at_end_time() {
        // ---
        let mut p = ProcessState::start("Run", ProcessKind::Ventilation, 1.0, None, t0());

        p.refresh(t0() + Duration::minutes(59));
        assert!(p.progress < 100);
        assert!(!p.is_completed());

        p.refresh(t0() + Duration::hours(1));
        assert_eq!(p.progress, 100);
        assert_eq!(p.time_left, "0h 00min");
        assert!(p.is_completed());

        // Well past the end: still pinned
        p.refresh(t0() + Duration::hours(30));
        assert_eq!(p.progress, 100);
        assert_eq!(p.time_left, "0h 00min");
    }

    #[test]
    fn clock_step_back_does_not_retreat_progress() {
        // ---
        let mut p = ProcessState::start("Run", ProcessKind::Ripening, 10.0, None, t0());

        p.refresh(t0() + Duration::hours(5));
        assert_eq!(p.progress, 50);

        p.refresh(t0() + Duration::hours(4));
        assert_eq!(p.progress, 50);
    }

    #[test]
    fn time_left_floors_to_whole_minutes() {
        // ---
        let mut p = ProcessState::start("Run", ProcessKind::Ripening, 2.0, None, t0());
        p.refresh(t0() + Duration::seconds(30 * 60 + 45));

        // 1h 29min 15s remaining floors to 1h 29min
        assert_eq!(p.time_left, "1h 29min");
    }

    #[test]
    fn start_process_wires_telemetry_and_power() {
        // ---
        let mut device = create_test_device();
        device.start_process(
            "Mango Run",
            ProcessKind::Ripening,
            72.0,
            Some(19.0),
            Some("rec-mango-kent-eu".to_string()),
            t0(),
        );

        assert_eq!(device.telemetry.state_process, ProcessKind::Ripening);
        assert_eq!(device.telemetry.set_point, 19.0);
        assert_eq!(device.telemetry.power_state, 1);
        let p = device.process.as_ref().unwrap();
        assert_eq!(p.recipe_id.as_deref(), Some("rec-mango-kent-eu"));
    }

    #[test]
    fn stop_is_idempotent_and_leaves_setpoints() {
        // ---
        let mut device = create_test_device();
        device.start_process("Run", ProcessKind::Cooling, 8.0, Some(10.0), None, t0());

        device.stop_process();
        assert!(device.process.is_none());
        assert_eq!(device.telemetry.state_process, ProcessKind::None);
        assert_eq!(device.telemetry.set_point, 10.0);
        assert_eq!(device.telemetry.power_state, 1);

        let snapshot = serde_json::to_value(&device).unwrap();
        device.stop_process();
        assert_eq!(serde_json::to_value(&device).unwrap(), snapshot);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        // ---
        let p = ProcessState::start("Run", ProcessKind::Ripening, 48.0, None, t0());
        let json = serde_json::to_value(&p).unwrap();

        assert!(json.get("startTime").is_some());
        assert!(json.get("endTime").is_some());
        assert!(json.get("currentPhase").is_some());
        assert!(json.get("timeLeft").is_some());
        // recipeId omitted when unset
        assert!(json.get("recipeId").is_none());
    }
}
