use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use workout_map_lib::{
    coerce_number, load_config_util, parse_color, save_config_util, storage, Config, ConfigError,
    Coordinates, FixedLocation, FormError, Geolocation, GeolocationError, MemoryStorage,
    SqliteStorage, StandardColor, StorageBackend, StorageError, Units, Workout, WorkoutError,
    WorkoutForm, WorkoutInput, WorkoutKind, WorkoutType, DEFAULT_ZOOM, WORKOUTS_KEY,
};

fn april_14() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 14, 10, 0, 0).unwrap()
}

fn form(workout_type: &str, distance: &str, duration: &str, cadence: &str, elevation: &str) -> WorkoutForm {
    WorkoutForm {
        workout_type: workout_type.to_string(),
        distance: distance.to_string(),
        duration: duration.to_string(),
        cadence: cadence.to_string(),
        elevation: elevation.to_string(),
    }
}

#[test]
fn test_running_pace_and_description() {
    let run = Workout::running(april_14(), Coordinates::new(39.0, -12.0), 5.2, 24.0, 178.0);

    assert_eq!(run.workout_type(), WorkoutType::Running);
    assert_eq!(run.pace_min_per_km(), Some(24.0 / 5.2));
    assert!((run.pace_min_per_km().unwrap() - 4.615).abs() < 0.001);
    assert_eq!(run.cadence(), Some(178.0));
    assert_eq!(run.speed_km_per_h(), None);
    assert_eq!(run.elevation_gain_m(), None);
    assert_eq!(run.description, "Running on April 14");
    assert_eq!(run.interaction_count, 0);
}

#[test]
fn test_cycling_speed_and_description() {
    let ride = Workout::cycling(april_14(), Coordinates::new(39.0, -12.0), 27.0, 95.0, 523.0);

    assert_eq!(ride.workout_type(), WorkoutType::Cycling);
    assert_eq!(ride.speed_km_per_h(), Some(27.0 / (95.0 / 60.0)));
    assert!((ride.speed_km_per_h().unwrap() - 17.05).abs() < 0.01);
    assert_eq!(ride.elevation_gain_m(), Some(523.0));
    assert_eq!(ride.pace_min_per_km(), None);
    assert_eq!(ride.description, "Cycling on April 14");
}

#[test]
fn test_id_uses_last_ten_timestamp_digits() {
    // 2024-04-14T10:00:00Z is 1713088800000 ms
    let run = Workout::running(april_14(), Coordinates::new(0.0, 0.0), 1.0, 5.0, 160.0);
    assert_eq!(run.id, "3088800000");
    assert_eq!(run.created_at, april_14());
}

#[test]
fn test_derived_fields_not_recomputed_on_plain_mutation() {
    let mut run = Workout::running(april_14(), Coordinates::new(0.0, 0.0), 5.0, 25.0, 170.0);
    run.distance_km = 10.0;
    run.click();
    run.click();

    assert_eq!(run.pace_min_per_km(), Some(5.0));
    assert_eq!(run.interaction_count, 2);
}

#[test]
fn test_apply_edit_recomputes_derived_fields() -> Result<()> {
    let mut ride = Workout::cycling(april_14(), Coordinates::new(1.0, 2.0), 30.0, 60.0, 100.0);
    ride.click();
    let original_id = ride.id.clone();

    ride.apply_edit(&WorkoutInput::Cycling {
        distance_km: 45.0,
        duration_min: 90.0,
        elevation_gain_m: -20.0,
    })?;

    assert_eq!(ride.id, original_id);
    assert_eq!(ride.distance_km, 45.0);
    assert_eq!(ride.duration_min, 90.0);
    assert_eq!(ride.speed_km_per_h(), Some(30.0));
    assert_eq!(ride.elevation_gain_m(), Some(-20.0));
    assert_eq!(ride.description, "Cycling on April 14");
    assert_eq!(ride.interaction_count, 1);
    assert_eq!(ride.coordinates, Coordinates::new(1.0, 2.0));
    Ok(())
}

#[test]
fn test_apply_edit_rejects_type_change() {
    let mut run = Workout::running(april_14(), Coordinates::new(0.0, 0.0), 5.0, 25.0, 170.0);
    let before = run.clone();

    let result = run.apply_edit(&WorkoutInput::Cycling {
        distance_km: 20.0,
        duration_min: 40.0,
        elevation_gain_m: 0.0,
    });

    assert_eq!(
        result,
        Err(WorkoutError::TypeChange {
            from: WorkoutType::Running,
            to: WorkoutType::Cycling
        })
    );
    assert_eq!(run, before);
}

#[test]
fn test_marker_label_and_popup_class() {
    let ride = Workout::cycling(april_14(), Coordinates::new(0.0, 0.0), 10.0, 30.0, 50.0);
    assert_eq!(ride.popup_class(), "cycling-popup");
    assert!(ride.marker_label().ends_with("Cycling on April 14"));
    assert!(ride.marker_label().starts_with(WorkoutType::Cycling.icon()));
}

#[test]
fn test_workout_type_parsing() {
    assert_eq!("running".parse::<WorkoutType>().ok(), Some(WorkoutType::Running));
    assert_eq!("Cycling".parse::<WorkoutType>().ok(), Some(WorkoutType::Cycling));
    assert!("swimming".parse::<WorkoutType>().is_err());
    assert_eq!(WorkoutType::Running.to_string(), "running");
}

#[test]
fn test_coordinates_validity() {
    assert!(Coordinates::new(39.0, -12.0).is_valid());
    assert!(Coordinates::new(-90.0, 180.0).is_valid());
    assert!(!Coordinates::new(91.0, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, -180.5).is_valid());
    assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
}

// --- Form validation ---

#[test]
fn test_coerce_number_follows_number_field_rules() {
    assert_eq!(coerce_number(" 5.2 "), 5.2);
    assert_eq!(coerce_number(""), 0.0);
    assert_eq!(coerce_number("   "), 0.0);
    assert!(coerce_number("five").is_nan());
    assert_eq!(coerce_number("-5"), -5.0);
    assert_eq!(coerce_number("1e3"), 1000.0);
}

#[test]
fn test_coerce_number_reads_radix_literals() -> Result<()> {
    assert_eq!(coerce_number("0x10"), 16.0);
    assert_eq!(coerce_number("0XfF"), 255.0);
    assert_eq!(coerce_number("0o17"), 15.0);
    assert_eq!(coerce_number("0b101"), 5.0);
    assert!(coerce_number("0x").is_nan());
    assert!(coerce_number("0x1g").is_nan());
    assert!(coerce_number("-0x10").is_nan());
    assert!(coerce_number("0b2").is_nan());

    let input = form("running", "0x10", "24", "178", "").validate()?;
    assert_eq!(input.distance_km(), 16.0);
    Ok(())
}

#[test]
fn test_valid_running_form() -> Result<()> {
    let input = form("running", "5.2", "24", "178", "").validate()?;
    assert_eq!(
        input,
        WorkoutInput::Running {
            distance_km: 5.2,
            duration_min: 24.0,
            cadence: 178.0
        }
    );
    assert_eq!(input.workout_type(), WorkoutType::Running);
    assert_eq!(input.distance_km(), 5.2);
    assert_eq!(input.duration_min(), 24.0);
    Ok(())
}

#[test]
fn test_running_form_rejects_bad_numbers() {
    let cases = [
        form("running", "-5", "24", "178", ""),
        form("running", "abc", "24", "178", ""),
        form("running", "5", "0", "178", ""),
        form("running", "5", "24", "", ""), // cadence blank -> 0
        form("running", "5", "24", "-10", ""),
    ];
    for case in cases {
        assert_eq!(
            case.validate(),
            Err(FormError::NotPositiveNumbers),
            "expected rejection for {case:?}"
        );
    }
}

#[test]
fn test_cycling_form_allows_zero_or_negative_elevation() -> Result<()> {
    let flat = form("cycling", "27", "95", "", "").validate()?;
    assert_eq!(
        flat,
        WorkoutInput::Cycling {
            distance_km: 27.0,
            duration_min: 95.0,
            elevation_gain_m: 0.0
        }
    );

    let downhill = form("cycling", "27", "95", "", "-40").validate()?;
    assert!(matches!(
        downhill,
        WorkoutInput::Cycling { elevation_gain_m, .. } if elevation_gain_m == -40.0
    ));
    Ok(())
}

#[test]
fn test_cycling_form_rejects_bad_numbers() {
    assert_eq!(
        form("cycling", "-27", "95", "", "523").validate(),
        Err(FormError::NotPositiveNumbers)
    );
    assert_eq!(
        form("cycling", "27", "95", "", "lots").validate(),
        Err(FormError::NotPositiveNumbers)
    );
}

#[test]
fn test_form_rejects_unknown_type() {
    let result = form("swimming", "1", "30", "", "").validate();
    assert_eq!(result, Err(FormError::UnknownType("swimming".to_string())));
}

#[test]
fn test_form_error_message() {
    assert_eq!(
        FormError::NotPositiveNumbers.to_string(),
        "Inputs have to be positive numbers"
    );
}

#[test]
fn test_form_from_workout_round_trips_values() -> Result<()> {
    let run = Workout::running(april_14(), Coordinates::new(0.0, 0.0), 5.2, 24.0, 178.0);
    let populated = WorkoutForm::from_workout(&run);

    assert_eq!(populated.workout_type, "running");
    assert_eq!(populated.distance, "5.2");
    assert_eq!(populated.duration, "24");
    assert_eq!(populated.cadence, "178");
    assert_eq!(populated.elevation, "");
    assert_eq!(
        populated.validate()?,
        WorkoutInput::Running {
            distance_km: 5.2,
            duration_min: 24.0,
            cadence: 178.0
        }
    );
    assert_eq!(WorkoutForm::new(WorkoutType::Cycling).workout_type, "cycling");
    Ok(())
}

// --- Persistence ---

fn sample_workouts() -> Vec<Workout> {
    let mut ride = Workout::cycling(
        Utc.with_ymd_and_hms(2024, 5, 2, 7, 30, 0).unwrap(),
        Coordinates::new(38.7, -9.1),
        27.0,
        95.0,
        523.0,
    );
    ride.click();
    vec![
        Workout::running(april_14(), Coordinates::new(39.0, -12.0), 5.2, 24.0, 178.0),
        ride,
    ]
}

#[test]
fn test_persisted_format_field_names() -> Result<()> {
    let backend = MemoryStorage::new();
    storage::save_workouts(&backend, &sample_workouts())?;

    let raw = backend.get_string(WORKOUTS_KEY)?.expect("workouts key written");
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let records = value.as_array().expect("array of records");
    assert_eq!(records.len(), 2);

    let run = &records[0];
    assert_eq!(run["type"], "running");
    assert_eq!(run["coordinates"], serde_json::json!([39.0, -12.0]));
    assert_eq!(run["distanceKm"], 5.2);
    assert_eq!(run["durationMin"], 24.0);
    assert_eq!(run["cadence"], 178.0);
    assert_eq!(run["id"], "3088800000");
    assert_eq!(run["description"], "Running on April 14");
    assert!(run.get("createdAt").is_some());
    assert!(run.get("paceMinPerKm").is_some());
    assert!(run.get("elevationGainM").is_none());

    let ride = &records[1];
    assert_eq!(ride["type"], "cycling");
    assert_eq!(ride["elevationGainM"], 523.0);
    assert_eq!(ride["interactionCount"], 1);
    assert!(ride.get("speedKmPerH").is_some());
    assert!(ride.get("cadence").is_none());
    Ok(())
}

#[test]
fn test_persist_then_load_restores_variants() -> Result<()> {
    let backend = MemoryStorage::new();
    let workouts = sample_workouts();
    storage::save_workouts(&backend, &workouts)?;

    let loaded = storage::load_workouts(&backend)?;
    assert_eq!(loaded.len(), workouts.len());
    assert_eq!(loaded, workouts);
    assert!(matches!(loaded[0].kind, WorkoutKind::Running { .. }));
    assert!(matches!(loaded[1].kind, WorkoutKind::Cycling { .. }));
    Ok(())
}

#[test]
fn test_load_absent_or_blank_is_empty() -> Result<()> {
    let backend = MemoryStorage::new();
    assert!(storage::load_workouts(&backend)?.is_empty());

    backend.set_string(WORKOUTS_KEY, "")?;
    assert!(storage::load_workouts(&backend)?.is_empty());
    Ok(())
}

#[test]
fn test_load_plain_records_with_integer_numbers() -> Result<()> {
    let backend = MemoryStorage::new();
    backend.set_string(
        WORKOUTS_KEY,
        r#"[{"type":"cycling","coordinates":[39,-12],"distanceKm":27,"durationMin":95,
            "id":"1234567890","createdAt":"2024-04-14T10:00:00Z","description":"Cycling on April 14",
            "elevationGainM":523,"speedKmPerH":17.05}]"#,
    )?;

    let loaded = storage::load_workouts(&backend)?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].workout_type(), WorkoutType::Cycling);
    assert_eq!(loaded[0].coordinates, Coordinates::new(39.0, -12.0));
    assert_eq!(loaded[0].elevation_gain_m(), Some(523.0));
    assert_eq!(loaded[0].interaction_count, 0); // Missing field defaults
    Ok(())
}

#[test]
fn test_load_malformed_data_is_an_error() -> Result<()> {
    let backend = MemoryStorage::new();
    backend.set_string(WORKOUTS_KEY, "{not json")?;
    assert!(matches!(
        storage::load_workouts(&backend),
        Err(StorageError::Json(_))
    ));

    backend.set_string(
        WORKOUTS_KEY,
        r#"[{"type":"swimming","coordinates":[0,0],"distanceKm":1,"durationMin":30,
            "id":"1","createdAt":"2024-04-14T10:00:00Z","description":"x"}]"#,
    )?;
    assert!(matches!(
        storage::load_workouts(&backend),
        Err(StorageError::Json(_))
    ));
    Ok(())
}

#[test]
fn test_clear_workouts_removes_key() -> Result<()> {
    let backend = MemoryStorage::new();
    storage::save_workouts(&backend, &sample_workouts())?;
    storage::clear_workouts(&backend)?;

    assert_eq!(backend.get_string(WORKOUTS_KEY)?, None);
    assert!(storage::load_workouts(&backend)?.is_empty());
    Ok(())
}

#[test]
fn test_sqlite_storage_key_value_operations() -> Result<()> {
    let backend = SqliteStorage::open_in_memory()?;
    assert_eq!(backend.get_string("missing")?, None);

    backend.set_string("k", "first")?;
    backend.set_string("k", "second")?; // Upsert
    assert_eq!(backend.get_string("k")?.as_deref(), Some("second"));

    backend.remove("k")?;
    backend.remove("k")?; // Removing twice is fine
    assert_eq!(backend.get_string("k")?, None);
    Ok(())
}

#[test]
fn test_sqlite_storage_survives_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("storage.sqlite");

    {
        let backend = SqliteStorage::open(&path)?;
        storage::save_workouts(&backend, &sample_workouts())?;
    }

    let reopened = SqliteStorage::open(&path)?;
    let loaded = storage::load_workouts(&reopened)?;
    assert_eq!(loaded, sample_workouts());
    Ok(())
}

// --- Geolocation ---

#[test]
fn test_fixed_location() {
    let home = Coordinates::new(38.7, -9.1);
    assert_eq!(FixedLocation(Some(home)).current_position(), Ok(home));
    assert_eq!(
        FixedLocation(None).current_position(),
        Err(GeolocationError::Unavailable)
    );
    assert!(matches!(
        FixedLocation(Some(Coordinates::new(120.0, 0.0))).current_position(),
        Err(GeolocationError::PositionUnavailable(_))
    ));
}

// --- Config ---

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.units, Units::Metric);
    assert_eq!(config.home, None);
    assert_eq!(config.map.zoom, DEFAULT_ZOOM);
    assert_eq!(config.map.zoom, 15);
    assert!(config.map.tile_url.contains("openstreetmap"));
    assert_eq!(config.theme.header_color, "Green");
}

#[test]
fn test_config_load_creates_default_and_round_trips() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config.toml");

    let created = load_config_util(&path)?;
    assert!(path.exists());
    assert_eq!(created, Config::default());

    let mut config = created;
    config.set_home(Coordinates::new(39.0, -12.0))?;
    config.set_zoom(12)?;
    config.units = Units::Imperial;
    save_config_util(&path, &config)?;

    let reloaded = load_config_util(&path)?;
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.home, Some(Coordinates::new(39.0, -12.0)));
    Ok(())
}

#[test]
fn test_config_partial_file_uses_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "units = \"imperial\"\n\n[map]\nzoom = 13\n")?;

    let config = load_config_util(&path)?;
    assert_eq!(config.units, Units::Imperial);
    assert_eq!(config.map.zoom, 13);
    assert_eq!(config.map.tile_url, Config::default().map.tile_url);
    assert_eq!(config.theme.header_color, "Green");
    Ok(())
}

#[test]
fn test_config_rejects_invalid_values() {
    let mut config = Config::default();
    assert!(matches!(
        config.set_home(Coordinates::new(95.0, 0.0)),
        Err(ConfigError::InvalidHome(_))
    ));
    assert!(matches!(config.set_zoom(25), Err(ConfigError::InvalidZoom(25))));
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_color() {
    assert_eq!(parse_color("darkblue").ok(), Some(StandardColor::DarkBlue));
    assert_eq!(parse_color("Green").ok(), Some(StandardColor::Green));
    assert!(matches!(
        parse_color("chartreuse"),
        Err(ConfigError::InvalidColor(_))
    ));
}
