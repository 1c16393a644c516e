//src/main.rs
mod cli;
mod terminal;

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdin, stdout, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use terminal::{TerminalMap, TerminalView};
use workout_map_lib::{
    AppError, AppService, Coordinates, ListTarget, Units, Workout, WorkoutForm, WorkoutType,
    KM_TO_MILE, M_TO_FT,
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Only the map-facing commands print what the map draws
    let verbose_map = matches!(
        cli_args.command,
        cli::Commands::Map | cli::Commands::Show { .. }
    );
    let mut service = AppService::initialize(
        Box::new(TerminalMap::new(verbose_map)),
        Box::new(TerminalView),
    )
    .context("Failed to initialize application service")?;

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Add {
            type_,
            lat,
            lng,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            let coordinates = Coordinates::new(lat, lng);
            if !coordinates.is_valid() {
                bail!("Invalid location {coordinates}. Latitude must be within -90..90 and longitude within -180..180.");
            }
            let form = WorkoutForm {
                workout_type: WorkoutType::from(type_).to_string(),
                distance,
                duration,
                cadence: cadence.unwrap_or_default(),
                elevation: elevation.unwrap_or_default(),
            };

            service.app.handle_map_click(coordinates);
            match service.app.submit_form(&form) {
                Ok(workout) => println!(
                    "Successfully added workout: '{}' at {} ID: {}",
                    workout.description, workout.coordinates, workout.id
                ),
                Err(e) => bail!("Error adding workout: {}", e),
            }
        }
        cli::Commands::Edit {
            id,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            if distance.is_none() && duration.is_none() && cadence.is_none() && elevation.is_none()
            {
                bail!("Nothing to change. Pass at least one of --distance, --duration, --cadence, --elevation.");
            }
            let current = match service.app.begin_edit(&id) {
                Ok(form) => form,
                Err(e) => bail!("Error editing workout ID {}: {}", id, e),
            };
            // Fields not given keep the values the form was populated with
            let form = WorkoutForm {
                distance: distance.unwrap_or(current.distance),
                duration: duration.unwrap_or(current.duration),
                cadence: cadence.unwrap_or(current.cadence),
                elevation: elevation.unwrap_or(current.elevation),
                ..current
            };
            match service.app.submit_edit(&form) {
                Ok(workout) => println!(
                    "Successfully updated workout ID {} ('{}').",
                    workout.id, workout.description
                ),
                Err(e) => bail!("Error editing workout ID {}: {}", id, e),
            }
        }
        cli::Commands::Delete { id } => {
            match service.app.handle_list_click(&id, ListTarget::Delete) {
                Ok(()) => println!("Successfully deleted workout ID {id}."),
                Err(AppError::WorkoutNotFound(_)) => {
                    println!("Workout ID {id} not found. Nothing deleted.");
                }
                Err(e) => bail!("Error deleting workout ID {}: {}", id, e),
            }
        }
        cli::Commands::List { limit, type_ } => {
            let type_filter = type_.map(WorkoutType::from);
            let workouts: Vec<&Workout> = service
                .app
                .workouts()
                .iter()
                .rev() // Newest entries sit at the top of the list
                .filter(|w| type_filter.map_or(true, |t| w.workout_type() == t))
                .take(limit.unwrap_or(usize::MAX))
                .collect();

            if workouts.is_empty() {
                println!("No workouts found matching the criteria.");
            } else if export_csv {
                print_workout_csv(&workouts, service.config.units)?;
            } else {
                let header_color = workout_map_lib::parse_color(&service.config.theme.header_color)
                    .map(Color::from)
                    .unwrap_or(Color::Green); // Fallback
                print_workout_table(&workouts, header_color, service.config.units);
            }
        }
        cli::Commands::Show { id } => {
            if service.app.find_workout(&id).is_none() {
                println!("Workout ID {id} not found.");
                return Ok(());
            }
            let geolocation = service.geolocation();
            if service.app.start(&geolocation).is_err() {
                println!("Map unavailable. Set a home position with 'set-home <lat> <lng>'.");
            }
            if let Err(e) = service.app.handle_list_click(&id, ListTarget::Body) {
                bail!("Error showing workout ID {}: {}", id, e);
            }
            if let Some(workout) = service.app.find_workout(&id) {
                let header_color = workout_map_lib::parse_color(&service.config.theme.header_color)
                    .map(Color::from)
                    .unwrap_or(Color::Green);
                print_workout_table(&[workout], header_color, service.config.units);
            }
        }
        cli::Commands::Map => {
            let geolocation = service.geolocation();
            if service.app.start(&geolocation).is_err() {
                println!("Map unavailable. Set a home position with 'set-home <lat> <lng>'.");
            } else if service.app.workouts().is_empty() {
                println!("No workouts yet. Add one with 'add --type running --lat <lat> --lng <lng> ...'.");
            }
        }
        cli::Commands::Reset { yes } => {
            let count = service.app.workouts().len();
            if count == 0 {
                println!("No workouts to delete.");
                return Ok(());
            }
            if !yes && !confirm(&format!("Delete all {count} workouts? This cannot be undone."))? {
                println!("Reset cancelled.");
                return Ok(());
            }
            service
                .app
                .reset()
                .context("Failed to reset workouts")?;
            println!("Deleted {count} workouts.");
        }
        cli::Commands::SetHome { lat, lng } => {
            match service.set_home(Coordinates::new(lat, lng)) {
                Ok(()) => println!(
                    "Home position set to [{lat}, {lng}]. Config saved to {:?}",
                    service.get_config_path()
                ),
                Err(e) => bail!("Error setting home position: {}", e),
            }
        }
        cli::Commands::SetZoom { zoom } => match service.set_zoom(zoom) {
            Ok(()) => println!("Map zoom set to {zoom}."),
            Err(e) => bail!("Error setting zoom: {}", e),
        },
        cli::Commands::SetUnits { units } => {
            let units = Units::from(units);
            match service.set_units(units) {
                Ok(()) => println!("Units set to {units:?}."),
                Err(e) => bail!("Error setting units: {}", e),
            }
        }
        cli::Commands::StoragePath => {
            println!("Storage file is located at: {:?}", service.get_storage_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    stdout().flush()?; // Ensure the prompt is displayed before reading input

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn display_distance(km: f64, units: Units) -> f64 {
    match units {
        Units::Metric => km,
        Units::Imperial => km * KM_TO_MILE,
    }
}

/// Pace or speed, formatted with its unit.
fn format_metric(workout: &Workout, units: Units) -> String {
    match (workout.pace_min_per_km(), workout.speed_km_per_h(), units) {
        (Some(pace), _, Units::Metric) => format!("{pace:.1} min/km"),
        (Some(pace), _, Units::Imperial) => format!("{:.1} min/mi", pace / KM_TO_MILE),
        (_, Some(speed), Units::Metric) => format!("{speed:.2} km/h"),
        (_, Some(speed), Units::Imperial) => format!("{:.2} mph", speed * KM_TO_MILE),
        _ => "-".to_string(),
    }
}

/// Cadence or elevation gain, formatted with its unit.
fn format_attribute(workout: &Workout, units: Units) -> String {
    match (workout.cadence(), workout.elevation_gain_m(), units) {
        (Some(cadence), _, _) => format!("{cadence} spm"),
        (_, Some(gain), Units::Metric) => format!("{gain} m"),
        (_, Some(gain), Units::Imperial) => format!("{:.0} ft", gain * M_TO_FT),
        _ => "-".to_string(),
    }
}

fn print_workout_table(workouts: &[&Workout], header_color: Color, units: Units) {
    let distance_unit_str = match units {
        Units::Metric => "(km)",
        Units::Imperial => "(miles)",
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Logged (Local)").fg(header_color),
            Cell::new("Location").fg(header_color),
            Cell::new(format!("Distance {distance_unit_str}")).fg(header_color),
            Cell::new("Duration (min)").fg(header_color),
            Cell::new("Pace / Speed").fg(header_color),
            Cell::new("Cadence / Elevation").fg(header_color),
        ]);

    for workout in workouts {
        table.add_row(vec![
            Cell::new(&workout.id),
            Cell::new(format!(
                "{} {}",
                workout.workout_type().icon(),
                workout.description
            )),
            Cell::new(
                workout
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(workout.coordinates.to_string()),
            Cell::new(format!("{:.2}", display_distance(workout.distance_km, units))),
            Cell::new(workout.duration_min.to_string()),
            Cell::new(format_metric(workout, units)),
            Cell::new(format_attribute(workout, units)),
        ]);
    }

    println!("{table}");
}

fn print_workout_csv(workouts: &[&Workout], units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let distance_header = match units {
        Units::Metric => "Distance_km",
        Units::Imperial => "Distance_miles",
    };

    writer.write_record([
        "ID",
        "Type",
        "Description",
        "Timestamp_Local",
        "Latitude",
        "Longitude",
        distance_header,
        "Duration_min",
        "Pace_or_Speed",
        "Cadence_or_Elevation",
    ])?;

    for workout in workouts {
        writer.write_record([
            workout.id.clone(),
            workout.workout_type().to_string(),
            workout.description.clone(),
            workout.created_at.with_timezone(&Local).to_rfc3339(),
            workout.coordinates.lat.to_string(),
            workout.coordinates.lng.to_string(),
            format!("{:.2}", display_distance(workout.distance_km, units)),
            workout.duration_min.to_string(),
            format_metric(workout, units),
            format_attribute(workout, units),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
