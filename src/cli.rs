// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use workout_map_lib::{Units, WorkoutType};

#[derive(Parser, Debug)]
#[command(author, version, about = "Log running and cycling workouts on a map", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkoutTypeCli {
    Running,
    Cycling,
}

impl From<WorkoutTypeCli> for WorkoutType {
    fn from(value: WorkoutTypeCli) -> Self {
        match value {
            WorkoutTypeCli::Running => Self::Running,
            WorkoutTypeCli::Cycling => Self::Cycling,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

impl From<UnitsCli> for Units {
    fn from(value: UnitsCli) -> Self {
        match value {
            UnitsCli::Metric => Self::Metric,
            UnitsCli::Imperial => Self::Imperial,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log a workout at a map location
    Add {
        /// Type of workout
        #[arg(short, long = "type", value_enum)]
        type_: WorkoutTypeCli,
        /// Latitude of the clicked location
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the clicked location
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Distance in km
        #[arg(short, long, allow_hyphen_values = true)]
        distance: String,
        /// Duration in minutes
        #[arg(short = 'm', long, allow_hyphen_values = true)]
        duration: String,
        /// Cadence in steps/min (running)
        #[arg(short, long, allow_hyphen_values = true)]
        cadence: Option<String>,
        /// Elevation gain in metres (cycling)
        #[arg(short, long, allow_hyphen_values = true)]
        elevation: Option<String>,
    },
    /// Change a workout's distance, duration, cadence or elevation gain
    Edit {
        /// ID of the workout to edit
        id: String,
        #[arg(short, long, allow_hyphen_values = true)]
        distance: Option<String>,
        #[arg(short = 'm', long, allow_hyphen_values = true)]
        duration: Option<String>,
        #[arg(short, long, allow_hyphen_values = true)]
        cadence: Option<String>,
        #[arg(short, long, allow_hyphen_values = true)]
        elevation: Option<String>,
    },
    /// Delete a workout
    Delete {
        /// ID of the workout to delete
        id: String,
    },
    /// List logged workouts, newest first
    List {
        /// Show only the last N entries
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only show workouts of this type
        #[arg(long = "type", value_enum)]
        type_: Option<WorkoutTypeCli>,
    },
    /// Centre the map on a workout
    Show {
        /// ID of the workout
        id: String,
    },
    /// Open the map at the home position with a marker for every workout
    Map,
    /// Delete all workouts
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Set the home position used as the map's starting point
    SetHome {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
    },
    /// Set the map zoom level
    SetZoom { zoom: u8 },
    /// Set display units (Metric/Imperial)
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    /// Show the path to the storage file
    StoragePath,
    /// Show the path to the config file
    ConfigPath,
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
