// src/terminal.rs
//! Terminal stand-ins for the map and the page. The map prints what a map
//! widget would draw when `verbose` is set; the view only logs, since list
//! output is printed as a table by the commands.
use tracing::debug;
use workout_map_lib::{
    Coordinates, MapView, PanOptions, PopupOptions, Workout, WorkoutForm, WorkoutView,
};

pub struct TerminalMap {
    verbose: bool,
    markers: usize,
}

impl TerminalMap {
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            markers: 0,
        }
    }
}

impl MapView for TerminalMap {
    fn create_view(&mut self, center: Coordinates, zoom: u8) {
        debug!(%center, zoom, "Map view created");
        if self.verbose {
            println!("Map centred on {center} (zoom {zoom})");
        }
    }

    fn add_tile_layer(&mut self, url_template: &str, attribution: &str) {
        debug!(url_template, attribution, "Tile layer added");
    }

    fn set_view(&mut self, center: Coordinates, zoom: u8, options: PanOptions) {
        debug!(%center, zoom, animate = options.animate, "Map view moved");
        if self.verbose {
            println!(
                "Map moved to {center} (zoom {zoom}, {:.0}s pan)",
                options.duration_secs
            );
        }
    }

    fn add_marker(&mut self, coordinates: Coordinates, popup: &PopupOptions, content: &str) {
        self.markers += 1;
        debug!(%coordinates, class = %popup.class_name, content, "Marker added");
        if self.verbose {
            println!("  📍 {coordinates}  {content}");
        }
    }

    fn clear_markers(&mut self) {
        debug!(count = self.markers, "Markers cleared");
        self.markers = 0;
    }
}

#[derive(Default)]
pub struct TerminalView;

impl WorkoutView for TerminalView {
    fn show_form(&mut self, coordinates: Coordinates) {
        debug!(%coordinates, "Entry form opened");
    }

    fn hide_form(&mut self) {
        debug!("Entry form closed");
    }

    fn populate_form(&mut self, form: &WorkoutForm, type_locked: bool) {
        debug!(?form, type_locked, "Entry form filled");
    }

    fn render_workout(&mut self, workout: &Workout) {
        debug!(id = %workout.id, description = %workout.description, "Workout rendered");
    }

    fn clear_workouts(&mut self) {
        debug!("Workout list cleared");
    }

    fn set_reset_visible(&mut self, visible: bool) {
        debug!(visible, "Reset control toggled");
    }

    fn alert(&mut self, message: &str) {
        eprintln!("Alert: {message}");
    }
}
