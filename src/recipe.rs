//! Recipe model: phase templates and their assembly into an executable
//! sequence.
//!
//! A recipe names up to four phase configurations, one per canonical type.
//! The canonical order is fixed — Homogenization → Ripening → Venting →
//! Cooling — regardless of how the phases are stored, and only `enabled`
//! phases contribute to the executable sequence and total duration.
//!
//! Unit caveat: `duration` is hours for homogenization/ripening/cooling
//! but **minutes** for venting. Every duration sum must convert venting
//! by dividing by 60.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

// ---

/// Canonical phase types, declared in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Homogenization,
    Ripening,
    Venting,
    Cooling,
}

impl PhaseType {
    /// Fixed execution order of the four phases.
    pub const CANONICAL_ORDER: [PhaseType; 4] = [
        PhaseType::Homogenization,
        PhaseType::Ripening,
        PhaseType::Venting,
        PhaseType::Cooling,
    ];
}

/// Which probe drives a cooling phase's temperature target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempType {
    Air,
    Product,
}

/// One configured phase of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    // ---
    pub id: String,
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
    pub enabled: bool,
    /// Target temperature in °C.
    pub temp: f64,
    /// Hours, except minutes for venting phases.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethylene: Option<f64>,
    #[serde(default, rename = "co2Limit", skip_serializing_if = "Option::is_none")]
    pub co2_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, rename = "tempType", skip_serializing_if = "Option::is_none")]
    pub temp_type: Option<TempType>,
}

/// A named treatment protocol: phase templates for one fruit/use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    // ---
    pub id: String,
    pub name: String,
    pub fruit: String,
    pub description: String,
    pub phases: Vec<PhaseConfig>,
}

impl Recipe {
    // ---

    /// The executable phase sequence of this recipe.
    pub fn sequence(&self) -> Vec<PhaseConfig> {
        build_sequence(&self.phases)
    }

    /// Total run time of the enabled phases, in hours.
    pub fn total_duration_hours(&self) -> f64 {
        total_duration_hours(&self.phases)
    }

    /// Reject a recipe no process could be started from.
    pub fn validate(&self) -> Result<(), CoreError> {
        // ---
        if !self.phases.iter().any(|p| p.enabled) {
            return Err(CoreError::invalid(format!(
                "recipe '{}' has no enabled phases",
                self.id
            )));
        }
        Ok(())
    }
}

/// Assemble the executable sequence: canonical order, enabled phases only.
///
/// Storage order is irrelevant; at most one phase per type is taken.
pub fn build_sequence(phases: &[PhaseConfig]) -> Vec<PhaseConfig> {
    // ---
    PhaseType::CANONICAL_ORDER
        .iter()
        .filter_map(|t| {
            phases
                .iter()
                .find(|p| p.phase_type == *t && p.enabled)
                .cloned()
        })
        .collect()
}

/// Sum enabled phase durations in hours, converting venting minutes.
///
/// Disabled phases contribute zero regardless of their stored values.
pub fn total_duration_hours(phases: &[PhaseConfig]) -> f64 {
    // ---
    phases
        .iter()
        .filter(|p| p.enabled)
        .map(|p| match p.phase_type {
            PhaseType::Venting => p.duration / 60.0,
            _ => p.duration,
        })
        .sum()
}

/// Built-in catalog of reference recipes shipped with the service.
///
/// Immutable reference data; custom recipes authored by operators share
/// the same shape.
pub fn catalog() -> Vec<Recipe> {
    // ---
    vec![
        Recipe {
            id: "rec-mango-kent-eu".to_string(),
            name: "Kent Mango - Europe Export (Air Freight)".to_string(),
            fruit: "Mango".to_string(),
            description: "Standard protocol for air shipments to Europe. \
                          Focused on color homogeneity and firmness for a short trip."
                .to_string(),
            phases: vec![
                phase("ph-1", PhaseType::Homogenization, true, 20.0, 24.0)
                    .with_humidity(90.0),
                phase("ph-2", PhaseType::Ripening, true, 20.0, 24.0)
                    .with_ethylene(100.0)
                    .with_co2_limit(1.0)
                    .with_humidity(90.0),
                // 12 hours, expressed in minutes
                phase("ph-3", PhaseType::Venting, true, 18.0, 720.0).with_co2_limit(0.5),
                phase("ph-4", PhaseType::Cooling, true, 10.0, 6.0)
                    .with_temp_type(TempType::Product),
            ],
        },
        Recipe {
            id: "rec-palta-hass-local".to_string(),
            name: "Hass Avocado - Ready to Eat (Supermarkets)".to_string(),
            fruit: "Avocado".to_string(),
            description: "Accelerated ripening for immediate consumption in the \
                          local market."
                .to_string(),
            phases: vec![
                phase("ph-1", PhaseType::Homogenization, true, 18.0, 12.0)
                    .with_humidity(85.0),
                phase("ph-2", PhaseType::Ripening, true, 18.0, 48.0)
                    .with_ethylene(100.0)
                    .with_co2_limit(1.0)
                    .with_humidity(90.0),
                phase("ph-3", PhaseType::Venting, true, 15.0, 30.0).with_co2_limit(0.5),
                // No cooling needed for immediate delivery
                phase("ph-4", PhaseType::Cooling, false, 6.0, 0.0)
                    .with_temp_type(TempType::Product),
            ],
        },
        Recipe {
            id: "rec-banano-org-piura".to_string(),
            name: "Organic Banana - Piura (Conventional)".to_string(),
            fruit: "Banana".to_string(),
            description: "4 to 6 day ripening protocol for organic bananas from \
                          the Chira Valley."
                .to_string(),
            phases: vec![
                phase("ph-1", PhaseType::Homogenization, true, 18.0, 24.0)
                    .with_humidity(90.0),
                phase("ph-2", PhaseType::Ripening, true, 18.0, 24.0)
                    .with_ethylene(150.0)
                    .with_co2_limit(1.0)
                    .with_humidity(95.0),
                phase("ph-3", PhaseType::Venting, true, 16.0, 60.0).with_co2_limit(0.2),
                phase("ph-4", PhaseType::Cooling, true, 14.0, 12.0)
                    .with_temp_type(TempType::Air),
            ],
        },
        Recipe {
            id: "rec-arandano-frio".to_string(),
            name: "Blueberries - Cooling Only (Holding)".to_string(),
            fruit: "Blueberry".to_string(),
            description: "Rapid cooling only, for dispatch.".to_string(),
            phases: vec![
                phase("ph-1", PhaseType::Homogenization, false, 0.0, 0.0),
                phase("ph-2", PhaseType::Ripening, false, 0.0, 0.0),
                phase("ph-3", PhaseType::Venting, false, 0.0, 0.0),
                phase("ph-4", PhaseType::Cooling, true, 0.5, 4.0)
                    .with_temp_type(TempType::Product),
            ],
        },
    ]
}

fn phase(id: &str, phase_type: PhaseType, enabled: bool, temp: f64, duration: f64) -> PhaseConfig {
    // ---
    PhaseConfig {
        id: id.to_string(),
        phase_type,
        enabled,
        temp,
        duration,
        ethylene: None,
        co2_limit: None,
        humidity: None,
        temp_type: None,
    }
}

impl PhaseConfig {
    // ---
    fn with_ethylene(mut self, ppm: f64) -> Self {
        self.ethylene = Some(ppm);
        self
    }

    fn with_co2_limit(mut self, pct: f64) -> Self {
        self.co2_limit = Some(pct);
        self
    }

    fn with_humidity(mut self, pct: f64) -> Self {
        self.humidity = Some(pct);
        self
    }

    fn with_temp_type(mut self, temp_type: TempType) -> Self {
        self.temp_type = Some(temp_type);
        self
    }
}
