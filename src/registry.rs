//! Device registry: every read and read-modify-write on the fleet.
//!
//! The registry owns the `device:{id}` aggregates in the key-value store
//! and funnels all mutation through two paths: telemetry ingestion (driven
//! by the chambers themselves) and control dispatch (driven by operators).
//! Both can hit the same device concurrently, so every read-modify-write
//! runs under a per-device async lock held across get → mutate → set;
//! without it a racing ingest and dispatch would silently drop one
//! writer's update. History appends target unique timestamped keys and
//! need no lock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::commands::ControlCommand;
use crate::errors::CoreError;
use crate::history::{self, HistoryRecord, HistorySeries, HistorySource};
use crate::models::{
    Device, DeviceStatus, OperationalData, OperationalPatch, TelemetryData, TelemetryPatch,
};
use crate::seed::demo_fleet;
use crate::status::derive_status;
use crate::store::{KvStore, StoreError};

// ---

/// One telemetry report as posted by a chamber: a partial telemetry
/// sample with an optional operational-counters patch alongside.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryFrame {
    // ---
    #[serde(flatten)]
    pub telemetry: TelemetryPatch,
    #[serde(default)]
    pub operational: Option<OperationalPatch>,
}

/// Result of ingesting one telemetry frame.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IngestOutcome {
    /// The device was unknown and has been auto-provisioned.
    Provisioned {
        status: &'static str,
        device: Device,
    },
    /// The frame was folded into an existing device; the ack carries the
    /// current setpoint and mode so the chamber can reconcile.
    Acknowledged {
        set_point: f64,
        control_mode: crate::models::ProcessKind,
    },
}

/// Result of a seed request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeedOutcome {
    Seeded { count: usize },
    AlreadySeeded { count: usize },
}

/// The authoritative record of the fleet, over the KV contract.
pub struct Registry {
    // ---
    store: Arc<dyn KvStore>,
    device_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

fn device_key(id: &str) -> String {
    format!("device:{id}")
}

/// Default name given to an auto-provisioned chamber.
fn default_name(id: &str) -> String {
    // ---
    let skip = id.chars().count().saturating_sub(4);
    let tail: String = id.chars().skip(skip).collect();
    format!("Chamber {tail}")
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, CoreError> {
    // ---
    serde_json::to_value(value)
        .map_err(|e| CoreError::Storage(StoreError::decode(key, e)))
}

fn decode_device(key: &str, value: Value) -> Result<Device, CoreError> {
    // ---
    serde_json::from_value(value)
        .map_err(|e| CoreError::Storage(StoreError::decode(key, e)))
}

impl Registry {
    // ---

    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            device_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire this device's write lock, creating it on first use.
    ///
    /// The guard is owned so it can be held across the awaits of a full
    /// get → mutate → set cycle.
    async fn lock_device(&self, id: &str) -> OwnedMutexGuard<()> {
        // ---
        let lock = {
            let mut locks = self.device_locks.lock().await;
            Arc::clone(
                locks
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    async fn load(&self, id: &str) -> Result<Option<Device>, CoreError> {
        // ---
        let key = device_key(id);
        match self.store.get(&key).await? {
            Some(value) => Ok(Some(decode_device(&key, value)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, device: &Device) -> Result<(), CoreError> {
        // ---
        let key = device_key(&device.id);
        let value = encode(&key, device)?;
        self.store.set(&key, value).await?;
        Ok(())
    }

    // --- Reads ---

    /// All registered devices, progress refreshed, seeding the demo fleet
    /// on an empty registry.
    pub async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        // ---
        let values = self.store.get_by_prefix("device:").await?;

        let mut devices = if values.is_empty() {
            info!("Registry empty, loading demo fleet");
            let fleet = demo_fleet(Utc::now());
            for device in &fleet {
                self.save(device).await?;
            }
            fleet
        } else {
            values
                .into_iter()
                .map(|v| decode_device("device:", v))
                .collect::<Result<Vec<_>, _>>()?
        };

        let now = Utc::now();
        for device in &mut devices {
            device.refresh_progress(now);
        }
        Ok(devices)
    }

    /// One device by id, progress refreshed.
    pub async fn get_device(&self, id: &str) -> Result<Device, CoreError> {
        // ---
        let mut device = self.load(id).await?.ok_or_else(|| CoreError::not_found(id))?;
        device.refresh_progress(Utc::now());
        Ok(device)
    }

    // --- Telemetry ingestion ---

    /// Fold one telemetry frame into the registry.
    ///
    /// Unknown devices are auto-provisioned and acknowledged as created.
    /// Known devices get the sample merged, status re-derived from the
    /// merged telemetry, one immutable history record appended, and any
    /// active process refreshed, all before a single persist of the
    /// aggregate. Any storage failure aborts the ingest; a caller retry
    /// with the same frame is safe.
    pub async fn ingest(&self, id: &str, frame: TelemetryFrame) -> Result<IngestOutcome, CoreError> {
        // ---
        let _guard = self.lock_device(id).await;
        let now = Utc::now();

        let Some(mut device) = self.load(id).await? else {
            let device = provision(id, &frame, now);
            self.save(&device).await?;
            info!("Auto-provisioned device {} as '{}'", id, device.name);
            return Ok(IngestOutcome::Provisioned {
                status: "created",
                device,
            });
        };

        frame.telemetry.apply(&mut device.telemetry);
        device.telemetry.timestamp = Some(now);
        if let Some(operational) = &frame.operational {
            operational.apply(&mut device.operational);
        }

        device.status = derive_status(&device.telemetry);

        let record = HistoryRecord::new(&frame.telemetry, now);
        let key = history::history_key(id, now);
        self.store.set(&key, encode(&key, &record)?).await?;

        device.refresh_progress(now);
        if device.process.as_ref().is_some_and(|p| p.is_completed()) {
            debug!("Process on {} has completed; awaiting stop_process", id);
        }
        self.save(&device).await?;

        debug!(
            "Ingested frame for {}: status {:?}, mode {:?}",
            id, device.status, device.telemetry.state_process
        );
        Ok(IngestOutcome::Acknowledged {
            set_point: device.telemetry.set_point,
            control_mode: device.telemetry.state_process,
        })
    }

    // --- Control dispatch ---

    /// Apply a validated operator command to a device.
    pub async fn dispatch(&self, id: &str, command: ControlCommand) -> Result<Device, CoreError> {
        // ---
        let _guard = self.lock_device(id).await;

        let mut device = self.load(id).await?.ok_or_else(|| CoreError::not_found(id))?;

        match command {
            ControlCommand::SetProcess(params) => {
                // ---
                // A run started from a catalog template must reference a
                // startable recipe
                if let Some(recipe_id) = &params.recipe_id {
                    if let Some(recipe) =
                        crate::recipe::catalog().into_iter().find(|r| r.id == *recipe_id)
                    {
                        recipe.validate()?;
                    }
                }
                device.start_process(
                    params.name,
                    params.kind,
                    params.duration_hours,
                    params.set_point,
                    params.recipe_id,
                    Utc::now(),
                );
                if let Some(ppm) = params.ethylene {
                    device.telemetry.ethylene = Some(ppm);
                }
                if let Some(pct) = params.co2 {
                    device.telemetry.co2_reading = Some(pct);
                }
                device.status = DeviceStatus::Active;
                info!(
                    "Started {:?} process on {} ({}h)",
                    device.telemetry.state_process, id, params.duration_hours
                );
            }
            ControlCommand::StopProcess => {
                // ---
                device.stop_process();
                device.status = DeviceStatus::Active;
                info!("Stopped process on {}", id);
            }
            ControlCommand::ManualUpdate(params) => {
                // ---
                if let Some(name) = params.name {
                    device.name = name;
                }
                if let Some(v) = params.set_point {
                    device.telemetry.set_point = v;
                }
                if let Some(v) = params.power_state {
                    device.telemetry.power_state = v;
                }
                if let Some(v) = params.ethylene {
                    device.telemetry.ethylene = Some(v);
                }
                if let Some(v) = params.humidity_set_point {
                    device.telemetry.humidity_set_point = Some(v);
                }
                if let Some(v) = params.fan_speed {
                    device.telemetry.fan_speed = Some(v);
                }
                debug!("Applied manual update to {}", id);
            }
        }

        self.save(&device).await?;
        Ok(device)
    }

    // --- History ---

    /// Time-ordered history for a device over a `days`-long window.
    ///
    /// Falls back to a synthesized series when nothing is recorded or the
    /// window exceeds one day; the envelope's `source` field says which.
    pub async fn history(&self, id: &str, days: u32) -> Result<HistorySeries, CoreError> {
        // ---
        let recorded = self
            .store
            .get_by_prefix(&history::history_prefix(id))
            .await?;

        if recorded.is_empty() || days > 1 {
            debug!("Serving synthetic {days}-day history for {id}");
            return Ok(HistorySeries {
                source: HistorySource::Synthetic,
                points: history::synthetic_series(days),
            });
        }

        Ok(HistorySeries {
            source: HistorySource::Recorded,
            points: recorded,
        })
    }

    // --- Seeding ---

    /// Load the demo fleet if the registry is empty; a no-op otherwise.
    pub async fn seed(&self) -> Result<SeedOutcome, CoreError> {
        // ---
        let existing = self.store.get_by_prefix("device:").await?;
        if !existing.is_empty() {
            return Ok(SeedOutcome::AlreadySeeded {
                count: existing.len(),
            });
        }

        let fleet = demo_fleet(Utc::now());
        for device in &fleet {
            self.save(device).await?;
        }
        info!("Seeded demo fleet ({} devices)", fleet.len());
        Ok(SeedOutcome::Seeded { count: fleet.len() })
    }
}

/// Build a fresh device record from a first-contact frame.
fn provision(id: &str, frame: &TelemetryFrame, now: DateTime<Utc>) -> Device {
    // ---
    let mut telemetry = TelemetryData::default();
    frame.telemetry.apply(&mut telemetry);
    telemetry.timestamp = Some(now);

    let mut operational = OperationalData::default();
    if let Some(patch) = &frame.operational {
        patch.apply(&mut operational);
    }

    Device {
        id: id.to_string(),
        name: default_name(id),
        status: DeviceStatus::Active,
        telemetry,
        operational,
        process: None,
    }
}
