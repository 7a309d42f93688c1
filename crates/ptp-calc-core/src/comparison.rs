//! Baseline Comparison
//!
//! Derives per-field deltas between a widget's own result and the baseline a
//! sibling frame broadcast. Both sides are converted to the display unit
//! system before any arithmetic, so the comparison is the same whichever
//! system each side was last computed in.
//!
//! Percent change is relative to the baseline and is `None` when the
//! baseline value is zero.

use serde::Serialize;

use crate::calculator::{Calculator, ComparisonField};
use crate::model::CalcResult;
use crate::units::UnitSystem;

/// Relative change in percent, `None` when undefined
pub fn percent_diff(original: f64, new: f64) -> Option<f64> {
    if original == 0.0 || !original.is_finite() || !new.is_finite() {
        return None;
    }
    let percent = (new - original) / original * 100.0;
    percent.is_finite().then_some(percent)
}

/// Presentation hint for a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// New value is larger
    Increase,
    /// New value is smaller
    Decrease,
    /// Values are equal
    NoChange,
}

impl Direction {
    /// Direction of `delta`
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Increase
        } else if delta < 0.0 {
            Direction::Decrease
        } else {
            Direction::NoChange
        }
    }

    /// Kebab-case tag used in CSS classes
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
            Direction::NoChange => "no-change",
        }
    }
}

/// Localized strings used when rendering comparisons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonLabels {
    /// Label for the baseline column
    pub original: String,
    /// Label for the current column
    pub new_value: String,
    /// Label for the absolute delta
    pub diff: String,
    /// Label for the percent delta
    pub diff_percent: String,
    /// Shown in place of an undefined percent
    pub not_applicable: String,
}

impl Default for ComparisonLabels {
    fn default() -> Self {
        Self {
            original: "Original".to_string(),
            new_value: "New".to_string(),
            diff: "Diff".to_string(),
            diff_percent: "Diff %".to_string(),
            not_applicable: "N/A".to_string(),
        }
    }
}

/// Delta of one field, already in the display unit system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDelta {
    /// Baseline value
    pub original: f64,
    /// Current value
    pub new: f64,
    /// `new - original`
    pub delta: f64,
    /// Percent change relative to the baseline
    pub percent: Option<f64>,
    /// Display unit, `None` for dimensionless values
    pub unit: Option<&'static str>,
    /// Sign of the delta
    pub direction: Direction,
}

impl FieldDelta {
    /// Delta from `original` to `new`
    pub fn between(original: f64, new: f64, unit: Option<&'static str>) -> Self {
        let delta = new - original;
        Self {
            original,
            new,
            delta,
            percent: percent_diff(original, new),
            unit,
            direction: Direction::of(delta),
        }
    }

    /// `+50.00 cc [10.00%]`
    pub fn format(&self, labels: &ComparisonLabels) -> String {
        let sign = if self.delta > 0.0 { "+" } else { "" };
        format!(
            "{}{}{} [{}]",
            sign,
            fixed2(self.delta),
            unit_suffix(self.unit),
            percent_text(self.percent, labels)
        )
    }
}

/// Ordered field → delta mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    fields: Vec<(String, FieldDelta)>,
}

impl Comparison {
    /// Delta of `field`
    pub fn get(&self, field: &str) -> Option<&FieldDelta> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, delta)| delta)
    }

    /// Fields in comparison order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDelta)> {
        self.fields.iter().map(|(name, delta)| (name.as_str(), delta))
    }

    /// Number of compared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field could be compared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Compare `result` against `baseline` over `fields`, in `display` units
///
/// Fields missing or non-numeric on either side are left out.
pub fn compare(
    result: &CalcResult,
    baseline: &CalcResult,
    display: UnitSystem,
    fields: &[ComparisonField],
) -> Comparison {
    let fields = fields
        .iter()
        .filter_map(|field| {
            let original = field.value_in(baseline, display)?;
            let new = field.value_in(result, display)?;
            Some((
                field.path.to_string(),
                FieldDelta::between(original, new, field.quantity.unit_label(display)),
            ))
        })
        .collect();
    Comparison { fields }
}

/// [`compare`] over the calculator's own comparable fields
pub fn compare_for(
    calculator: Calculator,
    result: &CalcResult,
    baseline: &CalcResult,
    display: UnitSystem,
) -> Comparison {
    compare(result, baseline, display, calculator.comparison_fields())
}

/// `Original: 500.00 cc | New: 550.00 cc | Diff: 50.00 cc | Diff %: 10.00%`
pub fn format_numeric_comparison(
    original: f64,
    new: f64,
    unit: Option<&str>,
    labels: &ComparisonLabels,
) -> String {
    let suffix = unit_suffix(unit);
    format!(
        "{}: {}{} | {}: {}{} | {}: {}{} | {}: {}",
        labels.original,
        fixed2(original),
        suffix,
        labels.new_value,
        fixed2(new),
        suffix,
        labels.diff,
        fixed2(new - original),
        suffix,
        labels.diff_percent,
        percent_text(percent_diff(original, new), labels)
    )
}

/// Comparison line for non-numeric fields (geometry, chain pitch)
pub fn format_text_comparison(original: &str, new: &str, labels: &ComparisonLabels) -> String {
    format!(
        "{}: {} | {}: {} | {}: {} | {}: {}",
        labels.original,
        original,
        labels.new_value,
        new,
        labels.diff,
        labels.not_applicable,
        labels.diff_percent,
        labels.not_applicable
    )
}

fn fixed2(value: f64) -> String {
    let text = format!("{:.2}", value);
    // "-0.00" after rounding a tiny negative
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}

fn unit_suffix(unit: Option<&str>) -> String {
    unit.map(|u| format!(" {}", u)).unwrap_or_default()
}

fn percent_text(percent: Option<f64>, labels: &ComparisonLabels) -> String {
    match percent {
        Some(p) => format!("{}%", fixed2(p)),
        None => labels.not_applicable.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_diff() {
        assert_eq!(percent_diff(500.0, 550.0), Some(10.0));
        assert_eq!(percent_diff(0.0, 12.0), None);
        assert_eq!(percent_diff(f64::NAN, 1.0), None);
        assert_eq!(percent_diff(4.0, 3.0), Some(-25.0));
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::of(0.1), Direction::Increase);
        assert_eq!(Direction::of(-0.1), Direction::Decrease);
        assert_eq!(Direction::of(0.0), Direction::NoChange);
        assert_eq!(Direction::NoChange.as_str(), "no-change");
    }

    #[test]
    fn test_field_delta_format() {
        let labels = ComparisonLabels::default();
        assert_eq!(
            FieldDelta::between(500.0, 550.0, Some("cc")).format(&labels),
            "+50.00 cc [10.00%]"
        );
        assert_eq!(FieldDelta::between(3.2, 2.8, None).format(&labels), "-0.40 [-12.50%]");
        assert_eq!(FieldDelta::between(0.0, 0.0, Some("mm")).format(&labels), "0.00 mm [N/A]");
    }

    #[test]
    fn test_numeric_sentence() {
        let labels = ComparisonLabels::default();
        assert_eq!(
            format_numeric_comparison(500.0, 550.0, Some("cc"), &labels),
            "Original: 500.00 cc | New: 550.00 cc | Diff: 50.00 cc | Diff %: 10.00%"
        );
        assert_eq!(
            format_text_comparison("square", "oversquare", &labels),
            "Original: square | New: oversquare | Diff: N/A | Diff %: N/A"
        );
    }
}
