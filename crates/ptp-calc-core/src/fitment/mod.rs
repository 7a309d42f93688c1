//! Tire Fitment
//!
//! Cascading selection of vehicle type → rim → width → aspect (or flotation
//! size) against a read-only catalog. Every option list is derived from the
//! selection made so far, and changing a selection clears everything that
//! depended on it.

pub mod catalog;
pub mod flotation;
pub mod resolver;

pub use catalog::{FitmentCatalog, RimData, VehicleData, VehicleType, WidthEntry};
pub use flotation::FlotationSize;
pub use resolver::{FitmentResolver, FitmentSelection, TireInputs};

use thiserror::Error;

/// Errors raised when a selection does not fit the catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitmentError {
    /// Vehicle type tag not recognized
    #[error("Unknown vehicle type: {0}")]
    UnknownVehicleType(String),

    /// Value not among the current options
    #[error("{field} '{value}' is not offered for the current selection")]
    NotOffered {
        /// Backend name of the field
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// Vehicle type has no flotation sizes
    #[error("Flotation sizes are not available for {0}")]
    FlotationUnavailable(VehicleType),

    /// Width or aspect set while flotation mode is on
    #[error("Width and aspect are not used in flotation mode")]
    StandardSizingDisabled,

    /// Flotation size set while flotation mode is off
    #[error("Flotation mode is off")]
    FlotationModeOff,

    /// Catalog data failed validation
    #[error("Invalid fitment catalog: {0}")]
    Catalog(String),
}
