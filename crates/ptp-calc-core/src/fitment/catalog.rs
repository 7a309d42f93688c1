//! Fitment catalog
//!
//! `VehicleType → rim → width → {aspects, flotation}`. The built-in catalog is
//! constructed once on first use and shared read-only for the life of the
//! process. Alternative catalogs can be loaded from JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::FitmentError;

/// Vehicle categories offered by the tires calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    /// Passenger cars
    Car,
    /// Motorcycles
    Motorcycle,
    /// Pickups and SUVs
    LightTruck,
    /// Trucks and buses
    TruckCommercial,
    /// Racing karts
    Kart,
    /// Kartcross buggies
    Kartcross,
}

impl VehicleType {
    /// Every vehicle type, in menu order
    pub const ALL: [VehicleType; 6] = [
        VehicleType::Car,
        VehicleType::Motorcycle,
        VehicleType::LightTruck,
        VehicleType::TruckCommercial,
        VehicleType::Kart,
        VehicleType::Kartcross,
    ];

    /// Backend tag (`LightTruck`)
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Motorcycle => "Motorcycle",
            VehicleType::LightTruck => "LightTruck",
            VehicleType::TruckCommercial => "TruckCommercial",
            VehicleType::Kart => "Kart",
            VehicleType::Kartcross => "Kartcross",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = FitmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| FitmentError::UnknownVehicleType(s.to_string()))
    }
}

/// Aspect ratios and flotation sizes offered for one width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthEntry {
    /// Section width in mm, as shown in the dropdown
    pub width: String,
    /// Aspect ratios offered for this width
    #[serde(default)]
    pub aspects: Vec<u32>,
    /// Flotation labels listed under this width
    #[serde(default)]
    pub flotation: Vec<String>,
}

/// Widths offered for one rim diameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RimData {
    /// Rim diameter in inches
    pub rim: f64,
    /// Widths in dropdown order
    pub widths: Vec<WidthEntry>,
}

impl RimData {
    /// Entry for `width`
    pub fn width_entry(&self, width: &str) -> Option<&WidthEntry> {
        self.widths.iter().find(|entry| entry.width == width)
    }

    /// Width labels in dropdown order
    pub fn width_labels(&self) -> Vec<&str> {
        self.widths.iter().map(|entry| entry.width.as_str()).collect()
    }

    /// Every flotation size offered on this rim, first occurrence wins
    pub fn flotation_options(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.widths
            .iter()
            .flat_map(|entry| entry.flotation.iter())
            .map(String::as_str)
            .filter(|size| seen.insert(*size))
            .collect()
    }
}

/// Rims offered for one vehicle type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleData {
    /// Rims in dropdown order
    pub rims: Vec<RimData>,
}

impl VehicleData {
    /// Data for rim diameter `rim`
    pub fn rim_data(&self, rim: f64) -> Option<&RimData> {
        self.rims.iter().find(|data| data.rim == rim)
    }

    /// Rim diameters in dropdown order
    pub fn rims(&self) -> Vec<f64> {
        self.rims.iter().map(|data| data.rim).collect()
    }

    fn has_flotation(&self) -> bool {
        self.rims
            .iter()
            .flat_map(|rim| rim.widths.iter())
            .any(|entry| !entry.flotation.is_empty())
    }
}

/// Read-only fitment table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FitmentCatalog {
    vehicles: BTreeMap<VehicleType, VehicleData>,
}

impl FitmentCatalog {
    /// The catalog shipped with the widgets
    pub fn builtin() -> &'static FitmentCatalog {
        static CATALOG: OnceLock<FitmentCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let vehicles = [
                (VehicleType::Car, CAR),
                (VehicleType::Motorcycle, MOTORCYCLE),
                (VehicleType::LightTruck, LIGHT_TRUCK),
                (VehicleType::TruckCommercial, TRUCK_COMMERCIAL),
                (VehicleType::Kart, KART),
                (VehicleType::Kartcross, KARTCROSS),
            ]
            .into_iter()
            .map(|(vehicle, rows)| (vehicle, vehicle_from_rows(rows)))
            .collect();
            FitmentCatalog { vehicles }
        })
    }

    /// Load a catalog from JSON
    ///
    /// The shape is the serde form of this type:
    /// `{"Car": {"rims": [{"rim": 16, "widths": [{"width": "205", "aspects": [55]}]}]}}`
    pub fn from_json(json: &str) -> Result<Self, FitmentError> {
        let catalog: FitmentCatalog =
            serde_json::from_str(json).map_err(|e| FitmentError::Catalog(e.to_string()))?;
        catalog.check()?;
        Ok(catalog)
    }

    fn check(&self) -> Result<(), FitmentError> {
        for (vehicle, data) in &self.vehicles {
            for (i, rim) in data.rims.iter().enumerate() {
                if !(rim.rim.is_finite() && rim.rim > 0.0) {
                    return Err(FitmentError::Catalog(format!(
                        "{}: invalid rim {}",
                        vehicle, rim.rim
                    )));
                }
                if data.rims[..i].iter().any(|other| other.rim == rim.rim) {
                    return Err(FitmentError::Catalog(format!(
                        "{}: duplicate rim {}",
                        vehicle, rim.rim
                    )));
                }
                let mut widths = HashSet::new();
                for entry in &rim.widths {
                    if !widths.insert(entry.width.as_str()) {
                        return Err(FitmentError::Catalog(format!(
                            "{} rim {}: duplicate width {}",
                            vehicle, rim.rim, entry.width
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Vehicle types present in the catalog
    pub fn vehicle_types(&self) -> Vec<VehicleType> {
        self.vehicles.keys().copied().collect()
    }

    /// Rims offered for `vehicle`
    pub fn vehicle(&self, vehicle: VehicleType) -> Option<&VehicleData> {
        self.vehicles.get(&vehicle)
    }

    /// Widths offered for `vehicle` on `rim`
    pub fn rim_data(&self, vehicle: VehicleType, rim: f64) -> Option<&RimData> {
        self.vehicle(vehicle)?.rim_data(rim)
    }

    /// Aspects and flotation sizes for one width
    pub fn width_entry(&self, vehicle: VehicleType, rim: f64, width: &str) -> Option<&WidthEntry> {
        self.rim_data(vehicle, rim)?.width_entry(width)
    }

    /// Whether any entry for `vehicle` lists a flotation size
    pub fn supports_flotation(&self, vehicle: VehicleType) -> bool {
        self.vehicle(vehicle)
            .map(VehicleData::has_flotation)
            .unwrap_or(false)
    }
}

/// Dropdown label for a rim diameter (`16`, `17.5`)
pub fn rim_label(rim: f64) -> String {
    format!("{}", rim)
}

type WidthRow = (&'static str, &'static [u32], &'static [&'static str]);
type RimRow = (f64, &'static [WidthRow]);

fn vehicle_from_rows(rows: &[RimRow]) -> VehicleData {
    let rims = rows
        .iter()
        .map(|(rim, widths)| RimData {
            rim: *rim,
            widths: widths
                .iter()
                .map(|(width, aspects, flotation)| WidthEntry {
                    width: (*width).to_string(),
                    aspects: aspects.to_vec(),
                    flotation: flotation.iter().map(|s| (*s).to_string()).collect(),
                })
                .collect(),
        })
        .collect();
    VehicleData { rims }
}

const CAR: &[RimRow] = &[
    (
        12.0,
        &[
            ("135", &[70, 80], &[]),
            ("145", &[70, 80], &[]),
            ("155", &[70, 80], &[]),
            ("165", &[70], &[]),
        ],
    ),
    (
        13.0,
        &[
            ("145", &[65, 70, 80], &[]),
            ("155", &[65, 70, 80], &[]),
            ("165", &[65, 70, 80], &[]),
            ("175", &[65, 70], &[]),
        ],
    ),
    (
        14.0,
        &[
            ("165", &[60, 65, 70], &[]),
            ("175", &[60, 65, 70], &[]),
            ("185", &[60, 65, 70], &[]),
            ("195", &[60, 65], &[]),
        ],
    ),
    (
        15.0,
        &[
            ("175", &[55, 60, 65], &[]),
            ("185", &[55, 60, 65], &[]),
            ("195", &[55, 60, 65], &[]),
            ("205", &[55, 60], &[]),
            ("215", &[55, 60], &[]),
        ],
    ),
    (
        16.0,
        &[
            ("195", &[50, 55, 60], &[]),
            ("205", &[50, 55, 60], &[]),
            ("215", &[50, 55, 60], &[]),
            ("225", &[50, 55], &[]),
            ("235", &[50, 55], &[]),
        ],
    ),
    (
        17.0,
        &[
            ("205", &[45, 50, 55], &[]),
            ("215", &[45, 50, 55], &[]),
            ("225", &[45, 50, 55], &[]),
            ("235", &[45, 50], &[]),
            ("245", &[45, 50], &[]),
        ],
    ),
    (
        18.0,
        &[
            ("215", &[40, 45, 50], &[]),
            ("225", &[40, 45, 50], &[]),
            ("235", &[40, 45, 50], &[]),
            ("245", &[40, 45], &[]),
            ("255", &[40, 45], &[]),
            ("265", &[40, 45], &[]),
        ],
    ),
    (
        19.0,
        &[
            ("225", &[35, 40, 45], &[]),
            ("235", &[35, 40, 45], &[]),
            ("245", &[35, 40], &[]),
            ("255", &[35, 40], &[]),
            ("265", &[35, 40], &[]),
            ("275", &[35, 40], &[]),
        ],
    ),
    (
        20.0,
        &[
            ("235", &[30, 35, 40], &[]),
            ("245", &[30, 35, 40], &[]),
            ("255", &[30, 35], &[]),
            ("265", &[30, 35], &[]),
            ("275", &[30, 35], &[]),
            ("285", &[30, 35], &[]),
        ],
    ),
    (
        21.0,
        &[
            ("245", &[30, 35], &[]),
            ("255", &[30, 35], &[]),
            ("265", &[30, 35], &[]),
            ("275", &[30, 35], &[]),
            ("285", &[30], &[]),
        ],
    ),
    (
        22.0,
        &[
            ("255", &[30, 35], &[]),
            ("265", &[30, 35], &[]),
            ("275", &[30, 35], &[]),
            ("285", &[30, 35], &[]),
            ("295", &[30], &[]),
        ],
    ),
    (
        23.0,
        &[
            ("265", &[30], &[]),
            ("275", &[30], &[]),
            ("285", &[30], &[]),
            ("295", &[30], &[]),
        ],
    ),
    (
        24.0,
        &[
            ("275", &[30], &[]),
            ("285", &[30], &[]),
            ("295", &[25, 30], &[]),
            ("305", &[25, 30], &[]),
        ],
    ),
];

const MOTORCYCLE: &[RimRow] = &[
    (
        16.0,
        &[
            ("100", &[70, 90], &[]),
            ("110", &[70, 80, 90], &[]),
            ("120", &[60, 70], &[]),
            ("130", &[60, 70], &[]),
        ],
    ),
    (
        17.0,
        &[
            ("90", &[90], &[]),
            ("100", &[80, 90], &[]),
            ("110", &[70, 80], &[]),
            ("120", &[60, 70], &[]),
            ("130", &[60, 70], &[]),
            ("140", &[60, 70], &[]),
            ("150", &[60, 70], &[]),
            ("160", &[60], &[]),
            ("180", &[55, 60], &[]),
            ("190", &[50, 55], &[]),
            ("200", &[50, 55], &[]),
        ],
    ),
    (
        18.0,
        &[
            ("100", &[90], &["2.75-18", "3.00-18", "4.10-18"]),
            ("110", &[80, 90], &[]),
            ("120", &[70, 80], &[]),
            ("130", &[70], &[]),
            ("140", &[70], &[]),
            ("150", &[70], &["4.60-18", "5.10-18"]),
            ("160", &[60], &[]),
            ("180", &[55], &[]),
        ],
    ),
    (
        19.0,
        &[
            ("90", &[90], &[]),
            ("100", &[80, 90], &[]),
            ("110", &[80], &[]),
            ("120", &[70], &[]),
            ("130", &[70], &["5.10-19"]),
        ],
    ),
    (
        21.0,
        &[
            ("80", &[100], &["3.00-21"]),
            ("90", &[90], &[]),
            ("100", &[90], &[]),
        ],
    ),
];

const LIGHT_TRUCK: &[RimRow] = &[
    (
        15.0,
        &[
            ("215", &[70, 75], &[]),
            ("225", &[70, 75], &[]),
            ("235", &[70, 75], &["30x9.5R15", "31x10.5R15"]),
            ("245", &[75], &[]),
            ("265", &[70], &["32x11.5R15", "33x12.5R15"]),
        ],
    ),
    (
        16.0,
        &[
            ("215", &[70, 75], &[]),
            ("225", &[70, 75], &[]),
            ("235", &[70, 75], &["31x10.5R16", "33x12.5R16"]),
            ("245", &[70, 75], &[]),
            ("265", &[70], &["33x12.5R16", "35x12.5R16"]),
            ("285", &[70], &[]),
        ],
    ),
    (
        17.0,
        &[
            ("235", &[70, 75], &[]),
            ("245", &[70, 75], &[]),
            ("265", &[70], &[]),
            ("275", &[70], &[]),
            ("285", &[70], &["33x12.5R17", "35x12.5R17"]),
            ("305", &[65], &["35x12.5R17"]),
        ],
    ),
    (
        18.0,
        &[
            ("255", &[65, 70], &[]),
            ("265", &[65, 70], &[]),
            ("275", &[65], &[]),
            ("285", &[65], &["33x12.5R18", "35x12.5R18"]),
            ("305", &[60], &["35x12.5R18"]),
        ],
    ),
    (
        19.0,
        &[
            ("255", &[65, 70], &[]),
            ("265", &[65, 70], &[]),
            ("275", &[65], &[]),
            ("285", &[65], &[]),
            ("305", &[60], &[]),
            ("325", &[60], &[]),
        ],
    ),
    (
        20.0,
        &[
            ("265", &[60, 65], &[]),
            ("275", &[60, 65], &[]),
            ("285", &[60], &[]),
            ("305", &[55], &[]),
            ("325", &[55], &["35x12.5R20", "37x13.5R20"]),
        ],
    ),
    (
        21.0,
        &[
            ("275", &[55, 60], &[]),
            ("285", &[55, 60], &[]),
            ("305", &[55], &[]),
            ("325", &[50], &[]),
        ],
    ),
    (
        22.0,
        &[
            ("285", &[45, 50], &[]),
            ("305", &[45, 50], &["35x12.5R22", "37x12.5R22"]),
            ("325", &[50], &[]),
        ],
    ),
];

const TRUCK_COMMERCIAL: &[RimRow] = &[
    (
        17.5,
        &[
            ("205", &[70, 75], &[]),
            ("215", &[70, 75], &[]),
            ("225", &[70, 75], &[]),
            ("235", &[70], &[]),
            ("245", &[70], &[]),
        ],
    ),
    (
        19.5,
        &[
            ("225", &[70, 75], &[]),
            ("245", &[70, 75], &[]),
            ("265", &[70], &[]),
            ("285", &[70], &[]),
        ],
    ),
    (
        22.5,
        &[
            ("245", &[70, 75], &[]),
            ("265", &[70, 75], &[]),
            ("275", &[70], &[]),
            ("295", &[75], &[]),
            ("315", &[80], &[]),
        ],
    ),
];

const KART: &[RimRow] = &[
    (
        5.0,
        &[
            ("100", &[60], &["10x3.50-5", "10x4.50-5"]),
            ("110", &[60], &["10x4.50-5"]),
            ("120", &[60], &["11x6.00-5", "11x7.10-5"]),
        ],
    ),
    (
        6.0,
        &[
            ("110", &[60], &[]),
            ("120", &[60], &["11x6.00-5", "11x7.10-5"]),
            ("130", &[60], &[]),
        ],
    ),
];

const KARTCROSS: &[RimRow] = &[
    (
        7.0,
        &[
            ("185", &[70], &["16x8-7"]),
            ("195", &[70], &[]),
            ("205", &[70], &[]),
        ],
    ),
    (
        8.0,
        &[
            ("175", &[70], &["19x7-8"]),
            ("195", &[70], &["18x9.5-8"]),
            ("215", &[70], &[]),
        ],
    ),
    (
        10.0,
        &[
            ("255", &[70], &["22x11-10"]),
            ("275", &[70], &[]),
        ],
    ),
];
