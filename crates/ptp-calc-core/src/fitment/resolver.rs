//! Cascading fitment selection
//!
//! The resolver owns a [`FitmentSelection`] and only lets it move through
//! states the catalog allows. Setting an ancestor clears every strict
//! descendant in the same call:
//!
//! | change            | clears                           |
//! |-------------------|----------------------------------|
//! | vehicle type      | rim, width, aspect, flotation    |
//! | rim               | width, aspect, flotation         |
//! | width             | aspect                           |
//! | flotation toggle  | flotation, width, aspect         |
//!
//! Option getters never fail: a missing link in the lookup chain yields an
//! empty list for that field and everything below it.

use serde::Serialize;

use super::catalog::{FitmentCatalog, RimData, VehicleType, WidthEntry};
use super::flotation::FlotationSize;
use super::FitmentError;
use crate::calculator::Calculator;
use crate::model::{CalcRequest, FieldErrors, REQUIRED};
use crate::units::UnitSystem;

/// Current dropdown state of one tires form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitmentSelection {
    vehicle_type: Option<VehicleType>,
    rim: Option<f64>,
    width: Option<String>,
    aspect: Option<u32>,
    rim_width: Option<f64>,
    flotation_enabled: bool,
    flotation: Option<String>,
}

impl FitmentSelection {
    /// Selected vehicle type
    pub fn vehicle_type(&self) -> Option<VehicleType> {
        self.vehicle_type
    }

    /// Selected rim diameter in inches
    pub fn rim(&self) -> Option<f64> {
        self.rim
    }

    /// Selected width label
    pub fn width(&self) -> Option<&str> {
        self.width.as_deref()
    }

    /// Selected aspect ratio
    pub fn aspect(&self) -> Option<u32> {
        self.aspect
    }

    /// Optional rim width in inches
    pub fn rim_width(&self) -> Option<f64> {
        self.rim_width
    }

    /// Whether flotation sizes replace width and aspect
    pub fn flotation_enabled(&self) -> bool {
        self.flotation_enabled
    }

    /// Selected flotation label
    pub fn flotation(&self) -> Option<&str> {
        self.flotation.as_deref()
    }
}

/// Validated tires inputs, keyed as the backend expects them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TireInputs {
    /// Vehicle category
    pub vehicle_type: VehicleType,
    /// Rim diameter in inches
    pub rim_in: f64,
    /// Section width in mm (standard sizing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_mm: Option<f64>,
    /// Aspect ratio in percent (standard sizing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_percent: Option<u32>,
    /// Flotation label (flotation sizing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flotation: Option<String>,
    /// Rim width in inches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim_width_in: Option<f64>,
}

impl TireInputs {
    /// Tires calculator request for these inputs
    pub fn to_request(&self, unit_system: UnitSystem) -> CalcRequest {
        let mut builder = CalcRequest::builder(Calculator::Tires, unit_system)
            .text("vehicle_type", self.vehicle_type.as_str())
            .number("rim_in", self.rim_in);
        if let Some(width) = self.width_mm {
            builder = builder.number("width_mm", width);
        }
        if let Some(aspect) = self.aspect_percent {
            builder = builder.number("aspect_percent", f64::from(aspect));
        }
        if let Some(flotation) = &self.flotation {
            builder = builder.text("flotation", flotation);
        }
        if let Some(rim_width) = self.rim_width_in {
            builder = builder.number("rim_width_in", rim_width);
        }
        builder.build()
    }
}

/// Selection state bound to a catalog
#[derive(Debug, Clone)]
pub struct FitmentResolver<'a> {
    catalog: &'a FitmentCatalog,
    selection: FitmentSelection,
}

impl FitmentResolver<'static> {
    /// Resolver over the built-in catalog
    pub fn builtin() -> Self {
        Self::new(FitmentCatalog::builtin())
    }
}

impl<'a> FitmentResolver<'a> {
    /// Empty selection over `catalog`
    pub fn new(catalog: &'a FitmentCatalog) -> Self {
        Self {
            catalog,
            selection: FitmentSelection::default(),
        }
    }

    /// Current selection
    pub fn selection(&self) -> &FitmentSelection {
        &self.selection
    }

    /// Catalog the selection is checked against
    pub fn catalog(&self) -> &'a FitmentCatalog {
        self.catalog
    }

    fn rim_data(&self) -> Option<&'a RimData> {
        self.catalog
            .rim_data(self.selection.vehicle_type?, self.selection.rim?)
    }

    fn width_entry(&self) -> Option<&'a WidthEntry> {
        self.rim_data()?.width_entry(self.selection.width.as_deref()?)
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    /// Vehicle types the catalog offers
    pub fn vehicle_type_options(&self) -> Vec<VehicleType> {
        self.catalog.vehicle_types()
    }

    /// Rims for the selected vehicle type
    pub fn rim_options(&self) -> Vec<f64> {
        self.selection
            .vehicle_type
            .and_then(|vehicle| self.catalog.vehicle(vehicle))
            .map(|data| data.rims())
            .unwrap_or_default()
    }

    /// Widths for the selected rim; empty in flotation mode
    pub fn width_options(&self) -> Vec<&'a str> {
        if self.selection.flotation_enabled {
            return Vec::new();
        }
        self.rim_data()
            .map(RimData::width_labels)
            .unwrap_or_default()
    }

    /// Aspects for the selected width; empty in flotation mode
    pub fn aspect_options(&self) -> Vec<u32> {
        if self.selection.flotation_enabled {
            return Vec::new();
        }
        self.width_entry()
            .map(|entry| entry.aspects.clone())
            .unwrap_or_default()
    }

    /// Flotation sizes for the selected rim; empty unless flotation mode is on
    pub fn flotation_options(&self) -> Vec<&'a str> {
        if !self.selection.flotation_enabled || !self.flotation_available() {
            return Vec::new();
        }
        self.rim_data()
            .map(RimData::flotation_options)
            .unwrap_or_default()
    }

    /// Whether the flotation toggle should be offered at all
    pub fn flotation_available(&self) -> bool {
        self.selection
            .vehicle_type
            .map(|vehicle| self.catalog.supports_flotation(vehicle))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// Select a vehicle type, clearing rim, width, aspect and flotation
    pub fn select_vehicle_type(&mut self, vehicle: Option<VehicleType>) -> Result<(), FitmentError> {
        if let Some(v) = vehicle {
            if self.catalog.vehicle(v).is_none() {
                return Err(FitmentError::NotOffered {
                    field: "vehicle_type",
                    value: v.to_string(),
                });
            }
        }
        if vehicle == self.selection.vehicle_type {
            return Ok(());
        }
        let sel = &mut self.selection;
        sel.vehicle_type = vehicle;
        sel.rim = None;
        sel.width = None;
        sel.aspect = None;
        sel.flotation = None;
        if !self.flotation_available() {
            self.selection.flotation_enabled = false;
        }
        Ok(())
    }

    /// Select a rim, clearing width, aspect and flotation
    pub fn select_rim(&mut self, rim: Option<f64>) -> Result<(), FitmentError> {
        if let Some(r) = rim {
            if !self.rim_options().contains(&r) {
                return Err(FitmentError::NotOffered {
                    field: "rim_in",
                    value: r.to_string(),
                });
            }
        }
        if rim == self.selection.rim {
            return Ok(());
        }
        let sel = &mut self.selection;
        sel.rim = rim;
        sel.width = None;
        sel.aspect = None;
        sel.flotation = None;
        Ok(())
    }

    /// Select a width, clearing aspect
    pub fn select_width(&mut self, width: Option<&str>) -> Result<(), FitmentError> {
        if let Some(w) = width {
            if self.selection.flotation_enabled {
                return Err(FitmentError::StandardSizingDisabled);
            }
            if !self.width_options().contains(&w) {
                return Err(FitmentError::NotOffered {
                    field: "width_mm",
                    value: w.to_string(),
                });
            }
        }
        if width == self.selection.width.as_deref() {
            return Ok(());
        }
        self.selection.width = width.map(str::to_string);
        self.selection.aspect = None;
        Ok(())
    }

    /// Select an aspect ratio
    pub fn select_aspect(&mut self, aspect: Option<u32>) -> Result<(), FitmentError> {
        if let Some(a) = aspect {
            if self.selection.flotation_enabled {
                return Err(FitmentError::StandardSizingDisabled);
            }
            if !self.aspect_options().contains(&a) {
                return Err(FitmentError::NotOffered {
                    field: "aspect_percent",
                    value: a.to_string(),
                });
            }
        }
        self.selection.aspect = aspect;
        Ok(())
    }

    /// Select a flotation size; flotation mode must be on
    pub fn select_flotation(&mut self, flotation: Option<&str>) -> Result<(), FitmentError> {
        if let Some(f) = flotation {
            if !self.selection.flotation_enabled {
                return Err(FitmentError::FlotationModeOff);
            }
            if !self.flotation_options().contains(&f) {
                return Err(FitmentError::NotOffered {
                    field: "flotation",
                    value: f.to_string(),
                });
            }
        }
        self.selection.flotation = flotation.map(str::to_string);
        Ok(())
    }

    /// Optional rim width in inches, independent of the cascade
    pub fn set_rim_width(&mut self, rim_width: Option<f64>) -> Result<(), FitmentError> {
        if let Some(w) = rim_width {
            if !(w.is_finite() && w > 0.0) {
                return Err(FitmentError::NotOffered {
                    field: "rim_width_in",
                    value: w.to_string(),
                });
            }
        }
        self.selection.rim_width = rim_width;
        Ok(())
    }

    /// Switch between standard (width/aspect) and flotation sizing
    pub fn set_flotation_enabled(&mut self, enabled: bool) -> Result<(), FitmentError> {
        if enabled && !self.flotation_available() {
            let vehicle = self
                .selection
                .vehicle_type
                .ok_or(FitmentError::NotOffered {
                    field: "vehicle_type",
                    value: String::new(),
                })?;
            return Err(FitmentError::FlotationUnavailable(vehicle));
        }
        if enabled == self.selection.flotation_enabled {
            return Ok(());
        }
        let sel = &mut self.selection;
        sel.flotation_enabled = enabled;
        sel.flotation = None;
        sel.width = None;
        sel.aspect = None;
        Ok(())
    }

    /// Clear the whole selection
    pub fn reset(&mut self) {
        self.selection = FitmentSelection::default();
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check required fields and produce the tires request inputs
    ///
    /// Error keys match the backend field names so they land on the same
    /// form fields as server-side errors.
    pub fn validate(&self) -> Result<TireInputs, FieldErrors> {
        let sel = &self.selection;
        let mut errors = FieldErrors::new();
        if sel.vehicle_type.is_none() {
            errors.insert("vehicle_type", REQUIRED);
        }
        if sel.rim.is_none() {
            errors.insert("rim_in", REQUIRED);
        }

        let mut width_mm = None;
        let mut aspect_percent = None;
        let mut flotation = None;
        if sel.flotation_enabled {
            match sel.flotation.as_deref() {
                None => errors.insert("flotation", REQUIRED),
                Some(label) if FlotationSize::parse(label).is_none() => {
                    errors.insert("flotation", "invalid flotation format")
                }
                Some(label) => flotation = Some(label.to_string()),
            }
        } else {
            match sel.width.as_deref().map(|w| w.parse::<f64>()) {
                None => errors.insert("width_mm", REQUIRED),
                Some(Ok(w)) => width_mm = Some(w),
                Some(Err(_)) => errors.insert("width_mm", "invalid width"),
            }
            match sel.aspect {
                None => errors.insert("aspect_percent", REQUIRED),
                Some(a) => aspect_percent = Some(a),
            }
        }

        match (sel.vehicle_type, sel.rim) {
            (Some(vehicle_type), Some(rim_in)) if errors.is_empty() => Ok(TireInputs {
                vehicle_type,
                rim_in,
                width_mm,
                aspect_percent,
                flotation,
                rim_width_in: sel.rim_width,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_has_no_dependent_options() {
        let resolver = FitmentResolver::builtin();
        assert_eq!(resolver.vehicle_type_options().len(), 6);
        assert!(resolver.rim_options().is_empty());
        assert!(resolver.width_options().is_empty());
        assert!(resolver.aspect_options().is_empty());
        assert!(resolver.flotation_options().is_empty());
        assert!(!resolver.flotation_available());
    }

    #[test]
    fn test_reselecting_same_value_keeps_descendants() {
        let mut resolver = FitmentResolver::builtin();
        resolver.select_vehicle_type(Some(VehicleType::Car)).unwrap();
        resolver.select_rim(Some(16.0)).unwrap();
        resolver.select_width(Some("205")).unwrap();
        resolver.select_rim(Some(16.0)).unwrap();
        assert_eq!(resolver.selection().width(), Some("205"));
    }

    #[test]
    fn test_flotation_toggle_rejected_for_car() {
        let mut resolver = FitmentResolver::builtin();
        resolver.select_vehicle_type(Some(VehicleType::Car)).unwrap();
        assert_eq!(
            resolver.set_flotation_enabled(true),
            Err(FitmentError::FlotationUnavailable(VehicleType::Car))
        );
    }

    #[test]
    fn test_changing_to_vehicle_without_flotation_turns_mode_off() {
        let mut resolver = FitmentResolver::builtin();
        resolver.select_vehicle_type(Some(VehicleType::Kart)).unwrap();
        resolver.set_flotation_enabled(true).unwrap();
        resolver.select_vehicle_type(Some(VehicleType::Car)).unwrap();
        assert!(!resolver.selection().flotation_enabled());
    }

    #[test]
    fn test_request_inputs_omit_unused_sizing() {
        let mut resolver = FitmentResolver::builtin();
        resolver.select_vehicle_type(Some(VehicleType::Kart)).unwrap();
        resolver.select_rim(Some(5.0)).unwrap();
        resolver.set_flotation_enabled(true).unwrap();
        resolver.select_flotation(Some("10x4.50-5")).unwrap();
        let request = resolver.validate().unwrap().to_request(UnitSystem::Metric);
        assert_eq!(
            request.to_body(),
            serde_json::json!({
                "unit_system": "metric",
                "inputs": {"vehicle_type": "Kart", "rim_in": 5.0, "flotation": "10x4.50-5"}
            })
        );
    }
}
