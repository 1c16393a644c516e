//src/view.rs
use crate::form::WorkoutForm;
use crate::workout::{Coordinates, Workout};

/// Which part of a list entry was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Edit,
    Delete,
    Body,
}

/// The form, the workout list and user alerts.
pub trait WorkoutView {
    fn show_form(&mut self, coordinates: Coordinates);

    /// Clears and hides the form.
    fn hide_form(&mut self);

    /// Fills the form; `type_locked` disables the type selector.
    fn populate_form(&mut self, form: &WorkoutForm, type_locked: bool);

    fn render_workout(&mut self, workout: &Workout);

    fn clear_workouts(&mut self);

    fn set_reset_visible(&mut self, visible: bool);

    /// Blocking message to the user.
    fn alert(&mut self, message: &str);
}
