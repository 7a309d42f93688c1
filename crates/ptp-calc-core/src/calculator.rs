//! Calculator descriptors
//!
//! Everything that differs between the four calculators (endpoint, message
//! names, required inputs, comparable result fields) lives here so that the
//! request client, the frame protocol and the comparison engine stay shared.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::model::{CalcResult, FieldErrors, REQUIRED};
use crate::units::{Quantity, UnitSystem};

/// Backend calculators a widget can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculator {
    /// Swept volume and compression ratio
    Displacement,
    /// Rod length to stroke ratio
    Rl,
    /// Final drive and chain
    Sprocket,
    /// Tire size and fitment
    Tires,
}

/// Where a result field's value is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Always in this system, whatever the result's `unit_system`
    Canonical(UnitSystem),
    /// In the result's own `unit_system`
    ResultSystem,
}

/// A numeric result field that takes part in baseline comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonField {
    /// Dotted path into `results`
    pub path: &'static str,
    /// How the value converts between unit systems
    pub quantity: Quantity,
    /// Unit system the value is stored in
    pub storage: Storage,
}

impl ComparisonField {
    const fn new(path: &'static str, quantity: Quantity, storage: Storage) -> Self {
        Self {
            path,
            quantity,
            storage,
        }
    }

    /// Read this field from `result` and express it in `display`
    pub fn value_in(&self, result: &CalcResult, display: UnitSystem) -> Option<f64> {
        let raw = result.number(self.path)?;
        let from = match self.storage {
            Storage::Canonical(system) => system,
            Storage::ResultSystem => result.unit_system,
        };
        Some(self.quantity.convert(raw, from, display))
    }
}

const METRIC: Storage = Storage::Canonical(UnitSystem::Metric);

const DISPLACEMENT_FIELDS: &[ComparisonField] = &[
    ComparisonField::new("displacement_cc", Quantity::Fixed("cc"), METRIC),
    ComparisonField::new("displacement_l", Quantity::Fixed("L"), METRIC),
    ComparisonField::new("displacement_ci", Quantity::Fixed("cu in"), METRIC),
    ComparisonField::new("compression.compression_ratio", Quantity::Ratio, METRIC),
    ComparisonField::new("compression.clearance_volume", Quantity::Volume, Storage::ResultSystem),
    ComparisonField::new("compression.swept_volume", Quantity::Volume, Storage::ResultSystem),
    ComparisonField::new("compression.trapped_volume", Quantity::Volume, Storage::ResultSystem),
    ComparisonField::new("compression.crankcase_compression_ratio", Quantity::Ratio, METRIC),
];

const RL_FIELDS: &[ComparisonField] = &[
    ComparisonField::new("rl_ratio", Quantity::Ratio, METRIC),
    ComparisonField::new("rod_stroke_ratio", Quantity::Ratio, METRIC),
    ComparisonField::new("displacement_cc", Quantity::Fixed("cc"), METRIC),
];

const SPROCKET_FIELDS: &[ComparisonField] = &[
    ComparisonField::new("ratio", Quantity::Ratio, METRIC),
    ComparisonField::new("chain_length_mm", Quantity::Length, METRIC),
    ComparisonField::new("center_distance_mm", Quantity::Length, METRIC),
];

const TIRES_FIELDS: &[ComparisonField] = &[
    ComparisonField::new("diameter", Quantity::Length, Storage::ResultSystem),
    ComparisonField::new("width", Quantity::Length, Storage::ResultSystem),
];

/// Normalized sprocket inputs forwarded as `inputs.baseline`
const SPROCKET_BASELINE_INPUTS: &[&str] =
    &["sprocket_teeth", "crown_teeth", "chain_pitch", "chain_links"];

impl Calculator {
    /// Every calculator, in menu order
    pub const ALL: [Calculator; 4] = [
        Calculator::Displacement,
        Calculator::Rl,
        Calculator::Sprocket,
        Calculator::Tires,
    ];

    /// Name used in URLs and message types
    pub fn name(&self) -> &'static str {
        match self {
            Calculator::Displacement => "displacement",
            Calculator::Rl => "rl",
            Calculator::Sprocket => "sprocket",
            Calculator::Tires => "tires",
        }
    }

    /// Proxy path the widget posts to
    pub fn endpoint(&self) -> String {
        format!("/api/v1/calc/{}", self.name())
    }

    /// `ptp:calc:<name>:baseline`
    pub fn baseline_message_type(&self) -> String {
        format!("ptp:calc:{}:baseline", self.name())
    }

    /// `ptp:calc:<name>:originalResult`
    pub fn original_result_message_type(&self) -> String {
        format!("ptp:calc:{}:originalResult", self.name())
    }

    /// Result fields compared against a baseline, in display order
    pub fn comparison_fields(&self) -> &'static [ComparisonField] {
        match self {
            Calculator::Displacement => DISPLACEMENT_FIELDS,
            Calculator::Rl => RL_FIELDS,
            Calculator::Sprocket => SPROCKET_FIELDS,
            Calculator::Tires => TIRES_FIELDS,
        }
    }

    /// Required input paths for the given inputs
    ///
    /// Some requirements depend on other inputs: the displacement
    /// compression block and the tires flotation/standard split.
    pub fn required_fields(&self, inputs: &Map<String, Value>) -> Vec<&'static str> {
        match self {
            Calculator::Displacement => {
                let mut fields = vec!["bore", "stroke", "cylinders"];
                if let Some(compression) = inputs.get("compression").and_then(Value::as_object) {
                    fields.push("compression.chamber_volume");
                    if compression.get("mode").and_then(Value::as_str) == Some("advanced") {
                        fields.extend([
                            "compression.gasket_thickness",
                            "compression.gasket_bore",
                            "compression.deck_height",
                            "compression.piston_volume",
                        ]);
                    }
                }
                fields
            }
            Calculator::Rl => vec!["bore", "stroke", "rod_length"],
            Calculator::Sprocket => vec!["sprocket_teeth", "crown_teeth"],
            Calculator::Tires => {
                if is_present(inputs.get("flotation")) {
                    vec!["vehicle_type", "rim_in", "flotation"]
                } else {
                    vec!["vehicle_type", "rim_in", "width_mm", "aspect_percent"]
                }
            }
        }
    }

    /// Required inputs that are absent, null or blank
    pub fn missing_fields(&self, inputs: &Map<String, Value>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for path in self.required_fields(inputs) {
            if !is_present(lookup(inputs, path)) {
                errors.insert(path, REQUIRED);
            }
        }
        errors
    }

    /// Baseline inputs a "new" widget forwards so the backend can diff
    ///
    /// Only the sprocket calculator takes them; its normalized inputs are
    /// unit-free (teeth counts, chain pitch code, link count).
    pub fn baseline_inputs(&self, baseline: &CalcResult) -> Option<Value> {
        if *self != Calculator::Sprocket {
            return None;
        }
        let mut inputs = Map::new();
        for name in SPROCKET_BASELINE_INPUTS {
            if let Some(value) = baseline.normalized_input(name) {
                if is_present(Some(value)) {
                    inputs.insert((*name).to_string(), value.clone());
                }
            }
        }
        if inputs.contains_key("sprocket_teeth") && inputs.contains_key("crown_teeth") {
            Some(Value::Object(inputs))
        } else {
            None
        }
    }
}

impl fmt::Display for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Calculator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Calculator::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown calculator '{}'", s))
    }
}

fn lookup<'a>(inputs: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = inputs.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_message_types() {
        assert_eq!(
            Calculator::Displacement.baseline_message_type(),
            "ptp:calc:displacement:baseline"
        );
        assert_eq!(
            Calculator::Tires.original_result_message_type(),
            "ptp:calc:tires:originalResult"
        );
        assert_eq!(Calculator::Rl.endpoint(), "/api/v1/calc/rl");
    }

    #[test]
    fn test_displacement_compression_requirements() {
        let simple = inputs(json!({"bore": 64, "stroke": 54, "cylinders": 1, "compression": {"mode": "simple"}}));
        let missing = Calculator::Displacement.missing_fields(&simple);
        assert_eq!(missing.fields(), vec!["compression.chamber_volume"]);

        let advanced = inputs(json!({
            "bore": 64, "stroke": 54, "cylinders": 1,
            "compression": {"mode": "advanced", "chamber_volume": 12.0, "gasket_bore": 66.0}
        }));
        let missing = Calculator::Displacement.missing_fields(&advanced);
        assert_eq!(
            missing.fields(),
            vec![
                "compression.deck_height",
                "compression.gasket_thickness",
                "compression.piston_volume"
            ]
        );
    }

    #[test]
    fn test_tires_requirements_depend_on_flotation() {
        let standard = inputs(json!({"vehicle_type": "Car", "rim_in": 16}));
        assert_eq!(
            Calculator::Tires.missing_fields(&standard).fields(),
            vec!["aspect_percent", "width_mm"]
        );
        let flotation = inputs(json!({"vehicle_type": "Kart", "rim_in": 5, "flotation": "10x4.50-5"}));
        assert!(Calculator::Tires.missing_fields(&flotation).is_empty());
    }

    #[test]
    fn test_blank_text_counts_as_missing() {
        let sprocket = inputs(json!({"sprocket_teeth": 14, "crown_teeth": "  "}));
        assert_eq!(
            Calculator::Sprocket.missing_fields(&sprocket).fields(),
            vec!["crown_teeth"]
        );
    }

    #[test]
    fn test_parse_calculator() {
        assert_eq!("rl".parse::<Calculator>(), Ok(Calculator::Rl));
        assert!("compression".parse::<Calculator>().is_err());
    }
}
