//! Unit Conversion Functions
//!
//! Provides the conversions used by the calculator widgets:
//! - Length: mm ↔ in
//! - Volume: cc ↔ cu in, cc ↔ L
//!
//! Every conversion is linear. One direction multiplies by the factor and the
//! other divides by the same factor, so metric → imperial → metric returns the
//! original value within floating-point tolerance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Cubic inches per cubic centimetre
pub const CUIN_PER_CC: f64 = 0.0610237441;

/// Cubic centimetres per litre
pub const CC_PER_LITER: f64 = 1000.0;

/// Measurement system a request was made in, or a result is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Millimetres and cubic centimetres
    #[default]
    Metric,
    /// Inches and cubic inches
    Imperial,
}

impl UnitSystem {
    /// Wire tag (`metric` / `imperial`)
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// The other system
    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            other => Err(format!("unknown unit system '{}'", other)),
        }
    }
}

/// Convert millimetres to inches
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Convert inches to millimetres
pub fn inches_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

/// Convert cubic centimetres to cubic inches
pub fn cc_to_cuin(cc: f64) -> f64 {
    cc * CUIN_PER_CC
}

/// Convert cubic inches to cubic centimetres
pub fn cuin_to_cc(cuin: f64) -> f64 {
    cuin / CUIN_PER_CC
}

/// Convert cubic centimetres to litres
pub fn cc_to_liters(cc: f64) -> f64 {
    cc / CC_PER_LITER
}

/// Convert litres to cubic centimetres
pub fn liters_to_cc(liters: f64) -> f64 {
    liters * CC_PER_LITER
}

/// Physical kind of a compared or converted value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// mm (metric) or in (imperial)
    Length,
    /// cc (metric) or cu in (imperial)
    Volume,
    /// Dimensionless, never converted and printed without a suffix
    Ratio,
    /// Always expressed in the given unit regardless of the unit system
    Fixed(&'static str),
}

impl Quantity {
    /// Convert `value` from one unit system to another
    pub fn convert(self, value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
        if from == to {
            return value;
        }
        match (self, to) {
            (Quantity::Length, UnitSystem::Imperial) => mm_to_inches(value),
            (Quantity::Length, UnitSystem::Metric) => inches_to_mm(value),
            (Quantity::Volume, UnitSystem::Imperial) => cc_to_cuin(value),
            (Quantity::Volume, UnitSystem::Metric) => cuin_to_cc(value),
            (Quantity::Ratio, _) | (Quantity::Fixed(_), _) => value,
        }
    }

    /// Display suffix in the given system, `None` when dimensionless
    pub fn unit_label(self, system: UnitSystem) -> Option<&'static str> {
        match (self, system) {
            (Quantity::Length, UnitSystem::Metric) => Some("mm"),
            (Quantity::Length, UnitSystem::Imperial) => Some("in"),
            (Quantity::Volume, UnitSystem::Metric) => Some("cc"),
            (Quantity::Volume, UnitSystem::Imperial) => Some("cu in"),
            (Quantity::Ratio, _) => None,
            (Quantity::Fixed(unit), _) => Some(unit),
        }
    }
}

/// Parse a decimal typed into a form field
///
/// Accepts a comma as the decimal separator ("64,5"). Returns `None` for
/// empty, unparsable or non-finite text.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Re-express a form field's text after the user toggles the unit system
///
/// The converted value is rounded to two decimals and printed without
/// trailing zeros. Empty or unparsable text is returned unchanged.
pub fn convert_input_text(text: &str, quantity: Quantity, from: UnitSystem, to: UnitSystem) -> String {
    if text.is_empty() || from == to {
        return text.to_string();
    }
    match parse_decimal(text) {
        Some(value) => {
            let rounded = (quantity.convert(value, from, to) * 100.0).round() / 100.0;
            // avoid printing "-0"
            let rounded = if rounded == 0.0 { 0.0 } else { rounded };
            format!("{}", rounded)
        }
        None => text.to_string(),
    }
}
