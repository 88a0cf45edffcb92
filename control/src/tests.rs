use super::*;

const CTRL: &str = "
# polarizable water
units = real
dielectric = 1.0
newton_pair = false
special_coul = 0.0 0.0 0.5

drude_types = C N N D   # O H H DO
drude_pairs = 1:4

pair_thole = 2.6 12.0
pair_coeff = 1 1 0.978 2.6
pair_coeff = 1 4 0.978 2.6
pair_coeff = 4 4 0.978 2.6

group = water type 1 2 3 4
group = drudes type 4
temp_group = water
temp_dynamic = true
";

#[test]
fn test_defaults() {
    let mut control = Control::new();
    control.read_str("").unwrap();

    assert_eq!(control.get_units().get_style(), UnitStyle::Real);
    assert_eq!(control.get_dimension(), 3);
    assert!(control.get_newton_pair());
    assert_eq!(control.get_special_coul(), [0.0, 0.0, 0.0]);
    assert_eq!(control.get_pair_thole(), vec!["2.6", "12.0"]);
    assert_eq!(control.get_transform_group(), "all");
    assert_eq!(control.get_temp_extra_dof(), 3.0);
    assert_eq!(control.get_system_file(), "in.system");
}

#[test]
fn test_read_parameters() {
    let mut control = Control::new();
    control.read_str(CTRL).unwrap();

    assert!(!control.get_newton_pair());
    assert_eq!(control.get_special_coul(), [0.0, 0.0, 0.5]);
    assert_eq!(control.get_drude_types(), "C N N D");
    assert_eq!(control.get_drude_pairs(), "1:4");
    assert_eq!(control.get_pair_coeff().len(), 3);
    assert_eq!(control.get_pair_coeff()[1], vec!["1", "4", "0.978", "2.6"]);
    assert_eq!(
        control.get_groups()[1],
        GroupDef {
            name: "drudes".to_string(),
            types: vec![4]
        }
    );
    assert_eq!(control.get_temp_group(), "water");
    assert!(control.get_temp_dynamic());
}

#[test]
fn test_rejected_input() {
    let mut control = Control::new();

    assert!(matches!(
        control.read_str("units = si"),
        Err(ControlError::InvalidValue { .. })
    ));
    assert!(matches!(
        control.read_str("dimension = 4"),
        Err(ControlError::InvalidValue { .. })
    ));
    assert!(matches!(
        control.read_str("special_coul = 0.0 0.5"),
        Err(ControlError::InvalidValue { .. })
    ));
    assert!(matches!(
        control.read_str("group = water 1 2"),
        Err(ControlError::InvalidValue { .. })
    ));
    assert!(matches!(
        control.read_str("units real"),
        Err(ControlError::MalformedLine { line: 1, .. })
    ));

    match control.read_str("ecut_wfc = 400\nunits = metal\nsmearing = gauss") {
        Err(ControlError::UnknownParameters(keys)) => {
            assert_eq!(keys, vec!["ecut_wfc".to_string(), "smearing".to_string()])
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_verbosity_sets_log_filter() {
    let mut control = Control::new();

    control.read_str("").unwrap();
    assert_eq!(control.get_verbosity(), "normal");
    assert_eq!(control.get_log_filter(), "info");

    control.read_str("verbosity = High").unwrap();
    assert_eq!(control.get_verbosity(), "high");
    assert_eq!(control.get_log_filter(), "debug");

    control.read_str("verbosity = low").unwrap();
    assert_eq!(control.get_log_filter(), "warn");

    assert!(matches!(
        control.read_str("verbosity = loud"),
        Err(ControlError::InvalidValue { .. })
    ));
}

#[test]
fn test_missing_file() {
    let mut control = Control::new();

    assert!(matches!(
        control.read_file("/nonexistent/in.ctrl"),
        Err(ControlError::Io { .. })
    ));
}
