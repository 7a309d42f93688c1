use pretty_assertions::assert_eq;

use ptp_calc_core::fitment::{
    FitmentCatalog, FitmentError, FitmentResolver, TireInputs, VehicleType,
};
use ptp_calc_core::model::REQUIRED;

fn light_truck_16() -> FitmentResolver<'static> {
    let mut resolver = FitmentResolver::builtin();
    resolver
        .select_vehicle_type(Some(VehicleType::LightTruck))
        .unwrap();
    resolver.select_rim(Some(16.0)).unwrap();
    resolver
}

#[test]
fn test_cascade_options() {
    let mut resolver = FitmentResolver::builtin();
    resolver
        .select_vehicle_type(Some(VehicleType::LightTruck))
        .unwrap();
    assert_eq!(
        resolver.rim_options(),
        vec![15.0, 16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0]
    );
    assert!(resolver.width_options().is_empty());

    resolver.select_rim(Some(16.0)).unwrap();
    assert_eq!(
        resolver.width_options(),
        vec!["215", "225", "235", "245", "265", "285"]
    );

    resolver.select_width(Some("235")).unwrap();
    assert_eq!(resolver.aspect_options(), vec![70, 75]);
}

#[test]
fn test_vehicle_change_clears_descendants() {
    let mut resolver = light_truck_16();
    resolver.select_width(Some("235")).unwrap();
    resolver.select_aspect(Some(75)).unwrap();
    resolver.set_rim_width(Some(7.0)).unwrap();

    resolver.select_vehicle_type(Some(VehicleType::Car)).unwrap();
    let selection = resolver.selection();
    assert_eq!(selection.vehicle_type(), Some(VehicleType::Car));
    assert_eq!(selection.rim(), None);
    assert_eq!(selection.width(), None);
    assert_eq!(selection.aspect(), None);
    assert_eq!(selection.flotation(), None);
    // rim width is not part of the cascade
    assert_eq!(selection.rim_width(), Some(7.0));
}

#[test]
fn test_rim_change_clears_width_and_aspect() {
    let mut resolver = light_truck_16();
    resolver.select_width(Some("235")).unwrap();
    resolver.select_aspect(Some(70)).unwrap();

    resolver.select_rim(Some(17.0)).unwrap();
    assert_eq!(resolver.selection().width(), None);
    assert_eq!(resolver.selection().aspect(), None);
    assert_eq!(
        resolver.width_options(),
        vec!["235", "245", "265", "275", "285", "305"]
    );
}

#[test]
fn test_width_change_clears_only_aspect() {
    let mut resolver = light_truck_16();
    resolver.select_width(Some("235")).unwrap();
    resolver.select_aspect(Some(75)).unwrap();

    resolver.select_width(Some("265")).unwrap();
    assert_eq!(resolver.selection().rim(), Some(16.0));
    assert_eq!(resolver.selection().aspect(), None);
    assert_eq!(resolver.aspect_options(), vec![70]);
}

#[test]
fn test_flotation_toggle_clears_sizing() {
    let mut resolver = light_truck_16();
    resolver.select_width(Some("235")).unwrap();
    resolver.select_aspect(Some(75)).unwrap();

    assert!(resolver.flotation_available());
    resolver.set_flotation_enabled(true).unwrap();
    assert_eq!(resolver.selection().width(), None);
    assert_eq!(resolver.selection().aspect(), None);
    assert!(resolver.width_options().is_empty());
    assert_eq!(
        resolver.flotation_options(),
        vec!["31x10.5R16", "33x12.5R16", "35x12.5R16"]
    );

    resolver.select_flotation(Some("33x12.5R16")).unwrap();
    resolver.set_flotation_enabled(false).unwrap();
    assert_eq!(resolver.selection().flotation(), None);
}

#[test]
fn test_off_catalog_values_are_rejected() {
    let mut resolver = light_truck_16();
    assert_eq!(
        resolver.select_width(Some("195")),
        Err(FitmentError::NotOffered {
            field: "width_mm",
            value: "195".to_string()
        })
    );
    assert!(resolver.select_rim(Some(14.0)).is_err());
    assert_eq!(resolver.selection().rim(), Some(16.0));

    resolver.select_width(Some("245")).unwrap();
    assert!(resolver.select_aspect(Some(55)).is_err());
    assert_eq!(
        resolver.select_flotation(Some("31x10.5R16")),
        Err(FitmentError::FlotationModeOff)
    );
}

#[test]
fn test_missing_links_yield_empty_options() {
    let mut resolver = FitmentResolver::builtin();
    resolver.select_vehicle_type(Some(VehicleType::Car)).unwrap();
    assert!(resolver.width_options().is_empty());
    assert!(resolver.aspect_options().is_empty());
    assert!(resolver.flotation_options().is_empty());
    assert!(!resolver.flotation_available());
}

#[test]
fn test_validate_standard_mode() {
    let mut resolver = FitmentResolver::builtin();
    let errors = resolver.validate().unwrap_err();
    assert_eq!(
        errors.fields(),
        vec!["aspect_percent", "rim_in", "vehicle_type", "width_mm"]
    );
    assert_eq!(errors.get("rim_in"), Some(REQUIRED));

    resolver
        .select_vehicle_type(Some(VehicleType::Car))
        .unwrap();
    resolver.select_rim(Some(16.0)).unwrap();
    resolver.select_width(Some("205")).unwrap();
    resolver.select_aspect(Some(55)).unwrap();
    assert_eq!(
        resolver.validate().unwrap(),
        TireInputs {
            vehicle_type: VehicleType::Car,
            rim_in: 16.0,
            width_mm: Some(205.0),
            aspect_percent: Some(55),
            flotation: None,
            rim_width_in: None,
        }
    );
}

#[test]
fn test_validate_flotation_mode() {
    let mut resolver = light_truck_16();
    resolver.set_flotation_enabled(true).unwrap();
    let errors = resolver.validate().unwrap_err();
    assert_eq!(errors.fields(), vec!["flotation"]);

    resolver.select_flotation(Some("35x12.5R16")).unwrap();
    let inputs = resolver.validate().unwrap();
    assert_eq!(inputs.flotation.as_deref(), Some("35x12.5R16"));
    assert_eq!(inputs.width_mm, None);
    assert_eq!(inputs.aspect_percent, None);
}

#[test]
fn test_motorcycle_flotation() {
    let mut resolver = FitmentResolver::builtin();
    resolver
        .select_vehicle_type(Some(VehicleType::Motorcycle))
        .unwrap();
    resolver.select_rim(Some(18.0)).unwrap();
    resolver.set_flotation_enabled(true).unwrap();
    assert_eq!(
        resolver.flotation_options(),
        vec!["2.75-18", "3.00-18", "4.10-18", "4.60-18", "5.10-18"]
    );
    resolver.select_flotation(Some("2.75-18")).unwrap();
    assert!(resolver.validate().is_ok());
}

#[test]
fn test_unparsable_catalog_flotation_fails_validation() {
    let json = r#"{"LightTruck": {"rims": [{"rim": 16, "widths": [
        {"width": "235", "aspects": [70], "flotation": ["thirty-one inch"]}
    ]}]}}"#;
    let catalog = FitmentCatalog::from_json(json).unwrap();
    let mut resolver = FitmentResolver::new(&catalog);
    resolver
        .select_vehicle_type(Some(VehicleType::LightTruck))
        .unwrap();
    resolver.select_rim(Some(16.0)).unwrap();
    resolver.set_flotation_enabled(true).unwrap();
    resolver.select_flotation(Some("thirty-one inch")).unwrap();
    let errors = resolver.validate().unwrap_err();
    assert_eq!(errors.get("flotation"), Some("invalid flotation format"));
}
