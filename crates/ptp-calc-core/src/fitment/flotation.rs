//! Flotation size labels
//!
//! Two label styles appear in the catalog:
//! - `31x10.5R16`, `10x4.50-5`: overall diameter × section width, rim
//! - `2.75-18`: section width, rim (motorcycle)
//!
//! All dimensions are in inches.

use regex::Regex;
use std::sync::OnceLock;

/// Dimensions parsed from a flotation label, in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlotationSize {
    /// Overall diameter; absent for motorcycle labels
    pub overall_in: Option<f64>,
    /// Section width
    pub width_in: f64,
    /// Rim diameter
    pub rim_in: f64,
}

fn flotation_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^([0-9.]+)x([0-9.]+)(?:R|-)([0-9.]+)$").ok())
        .as_ref()
}

fn motorcycle_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([0-9.]+)-([0-9.]+)$").ok())
        .as_ref()
}

fn dimension(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

impl FlotationSize {
    /// Parse a flotation label; `None` when it matches neither style
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(caps) = flotation_pattern()?.captures(label) {
            return Some(FlotationSize {
                overall_in: Some(dimension(&caps[1])?),
                width_in: dimension(&caps[2])?,
                rim_in: dimension(&caps[3])?,
            });
        }
        let caps = motorcycle_pattern()?.captures(label)?;
        Some(FlotationSize {
            overall_in: None,
            width_in: dimension(&caps[1])?,
            rim_in: dimension(&caps[2])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_truck_label() {
        let size = FlotationSize::parse("31x10.5R16").unwrap();
        assert_eq!(size.overall_in, Some(31.0));
        assert_eq!(size.width_in, 10.5);
        assert_eq!(size.rim_in, 16.0);
        assert!(FlotationSize::parse("33X12.5r17").is_some());
    }

    #[test]
    fn test_kart_label() {
        let size = FlotationSize::parse("10x4.50-5").unwrap();
        assert_eq!(size.overall_in, Some(10.0));
        assert_eq!(size.width_in, 4.5);
        assert_eq!(size.rim_in, 5.0);
    }

    #[test]
    fn test_motorcycle_label() {
        let size = FlotationSize::parse("2.75-18").unwrap();
        assert_eq!(size.overall_in, None);
        assert_eq!(size.width_in, 2.75);
        assert_eq!(size.rim_in, 18.0);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(FlotationSize::parse("205/55R16").is_none());
        assert!(FlotationSize::parse("31x..R16").is_none());
        assert!(FlotationSize::parse("").is_none());
    }
}
