//src/app.rs
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::form::{FormError, WorkoutForm, WorkoutInput};
use crate::geolocation::{Geolocation, GeolocationError};
use crate::map::{MapSettings, MapView, PanOptions, PopupOptions};
use crate::storage::{self, StorageBackend, StorageError};
use crate::view::{ListTarget, WorkoutView};
use crate::workout::{Coordinates, Workout, WorkoutError};

pub const GEOLOCATION_ALERT: &str = "Could not get current position";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    InvalidInput(#[from] FormError),
    #[error("Workout not found: ID {0}")]
    WorkoutNotFound(String),
    #[error("No map location selected. Click the map before submitting a workout.")]
    NoLocationSelected,
    #[error("No workout is being edited.")]
    NotEditing,
    #[error(transparent)]
    Workout(#[from] WorkoutError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}

/// Everything the handlers mutate, kept in one place.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub workouts: Vec<Workout>,
    pub map_ready: bool,
    /// Location of the last map click, waiting for a form submission.
    pub pending_click: Option<Coordinates>,
    /// Index of the workout being edited.
    pub editing: Option<usize>,
}

pub struct App {
    state: AppState,
    settings: MapSettings,
    storage: Box<dyn StorageBackend>,
    map: Box<dyn MapView>,
    view: Box<dyn WorkoutView>,
}

fn render_marker(map: &mut dyn MapView, workout: &Workout) {
    map.add_marker(
        workout.coordinates,
        &PopupOptions::sticky(workout.popup_class()),
        &workout.marker_label(),
    );
}

/// Next numeric id with the same width, or a suffixed id for non-numeric ones.
fn bump_id(id: &str) -> String {
    match id.parse::<u64>() {
        Ok(n) => {
            let width = id.len();
            let next = u32::try_from(width)
                .ok()
                .and_then(|w| 10u64.checked_pow(w))
                .map_or_else(|| n.wrapping_add(1), |modulus| (n + 1) % modulus);
            format!("{next:0width$}")
        }
        Err(_) => format!("{id}-1"),
    }
}

impl App {
    pub fn new(
        settings: MapSettings,
        storage: Box<dyn StorageBackend>,
        map: Box<dyn MapView>,
        view: Box<dyn WorkoutView>,
    ) -> Self {
        Self {
            state: AppState::default(),
            settings,
            storage,
            map,
            view,
        }
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.state.workouts
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub const fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn find_workout(&self, id: &str) -> Option<&Workout> {
        self.state.workouts.iter().find(|w| w.id == id)
    }

    fn position_of(&self, id: &str) -> Result<usize, AppError> {
        self.state
            .workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| AppError::WorkoutNotFound(id.to_string()))
    }

    /// Reads the persisted list into state and renders the list entries.
    /// Markers follow once the map exists.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the stored list cannot be read or parsed.
    pub fn load(&mut self) -> Result<usize, AppError> {
        self.state.workouts = storage::load_workouts(self.storage.as_ref())?;
        for workout in &self.state.workouts {
            self.view.render_workout(workout);
        }
        info!(count = self.state.workouts.len(), "Workouts loaded");
        Ok(self.state.workouts.len())
    }

    /// Looks up the current position once and builds the map around it.
    /// On failure the user is alerted and the app keeps working without a map.
    ///
    /// # Errors
    /// Returns `AppError::Geolocation` when no position could be obtained.
    pub fn start(&mut self, geolocation: &dyn Geolocation) -> Result<(), AppError> {
        match geolocation.current_position() {
            Ok(center) => {
                self.load_map(center);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Geolocation failed, continuing without map");
                self.view.alert(GEOLOCATION_ALERT);
                Err(e.into())
            }
        }
    }

    fn load_map(&mut self, center: Coordinates) {
        self.map.create_view(center, self.settings.zoom);
        self.map
            .add_tile_layer(&self.settings.tile_url, &self.settings.attribution);
        self.state.map_ready = true;

        if !self.state.workouts.is_empty() {
            for workout in &self.state.workouts {
                render_marker(self.map.as_mut(), workout);
            }
            self.view.set_reset_visible(true);
        }
        debug!(%center, zoom = self.settings.zoom, "Map ready");
    }

    pub fn handle_map_click(&mut self, coordinates: Coordinates) {
        self.state.pending_click = Some(coordinates);
        self.view.show_form(coordinates);
    }

    /// Submits the entry form. While an edit is in progress this finishes the
    /// edit instead of creating a new workout.
    ///
    /// # Errors
    /// - `AppError::InvalidInput` (after alerting) if validation fails.
    /// - `AppError::NoLocationSelected` if the map was not clicked first.
    /// - `AppError::Storage` if persisting fails.
    pub fn submit_form(&mut self, form: &WorkoutForm) -> Result<&Workout, AppError> {
        self.submit_form_at(form, Utc::now())
    }

    /// `submit_form` with an explicit creation time.
    ///
    /// # Errors
    /// Same as [`App::submit_form`].
    pub fn submit_form_at(
        &mut self,
        form: &WorkoutForm,
        created_at: DateTime<Utc>,
    ) -> Result<&Workout, AppError> {
        if self.state.editing.is_some() {
            return self.submit_edit(form);
        }

        let coordinates = self
            .state
            .pending_click
            .ok_or(AppError::NoLocationSelected)?;
        let input = self.validate_or_alert(form)?;

        let mut workout = Workout::from_input(created_at, coordinates, &input);
        while self.find_workout(&workout.id).is_some() {
            workout.id = bump_id(&workout.id);
        }

        let mut workouts = self.state.workouts.clone();
        workouts.push(workout);
        self.commit(workouts)?;

        let index = self.state.workouts.len() - 1;
        let workout = &self.state.workouts[index];
        if self.state.map_ready {
            render_marker(self.map.as_mut(), workout);
        }
        self.view.render_workout(workout);
        self.view.hide_form();
        self.view.set_reset_visible(true);
        self.state.pending_click = None;

        info!(id = %workout.id, kind = %workout.workout_type(), "Workout added");
        Ok(workout)
    }

    fn validate_or_alert(&mut self, form: &WorkoutForm) -> Result<WorkoutInput, AppError> {
        form.validate().map_err(|e| {
            self.view.alert(&e.to_string());
            AppError::InvalidInput(e)
        })
    }

    /// Dispatches a click inside the workout list.
    ///
    /// # Errors
    /// Propagates the error of the dispatched handler.
    pub fn handle_list_click(&mut self, id: &str, target: ListTarget) -> Result<(), AppError> {
        match target {
            ListTarget::Edit => {
                self.begin_edit(id)?;
                self.move_to_workout(id)
            }
            ListTarget::Delete => self.delete_workout(id),
            ListTarget::Body => self.move_to_workout(id),
        }
    }

    /// Re-centres the map on a workout. Does nothing before the map exists.
    ///
    /// # Errors
    /// Returns `AppError::WorkoutNotFound` for an unknown id.
    pub fn move_to_workout(&mut self, id: &str) -> Result<(), AppError> {
        if !self.state.map_ready {
            return Ok(());
        }
        let index = self.position_of(id)?;
        let center = self.state.workouts[index].coordinates;
        self.map
            .set_view(center, self.settings.zoom, PanOptions::default());
        Ok(())
    }

    /// Opens the form pre-filled with the workout's values, type locked.
    ///
    /// # Errors
    /// Returns `AppError::WorkoutNotFound` for an unknown id.
    pub fn begin_edit(&mut self, id: &str) -> Result<WorkoutForm, AppError> {
        let index = self.position_of(id)?;
        let workout = &self.state.workouts[index];
        let form = WorkoutForm::from_workout(workout);

        self.view.show_form(workout.coordinates);
        self.view.populate_form(&form, true);
        self.state.editing = Some(index);
        debug!(id, "Editing workout");
        Ok(form)
    }

    /// Applies the form to the workout being edited and recomputes its
    /// derived fields.
    ///
    /// # Errors
    /// - `AppError::NotEditing` if `begin_edit` was not called.
    /// - `AppError::InvalidInput` (after alerting); the edit stays open.
    /// - `AppError::Workout` if the form switches the workout type.
    /// - `AppError::Storage` if persisting fails.
    pub fn submit_edit(&mut self, form: &WorkoutForm) -> Result<&Workout, AppError> {
        let index = self.state.editing.ok_or(AppError::NotEditing)?;
        let input = self.validate_or_alert(form)?;

        let mut workouts = self.state.workouts.clone();
        if let Err(e) = workouts[index].apply_edit(&input) {
            self.view.alert(&e.to_string());
            return Err(e.into());
        }
        self.commit(workouts)?;

        self.state.editing = None;
        self.view.hide_form();
        info!(id = %self.state.workouts[index].id, "Workout updated");
        self.rerender();
        Ok(&self.state.workouts[index])
    }

    pub fn cancel_edit(&mut self) {
        if self.state.editing.take().is_some() {
            self.view.hide_form();
        }
    }

    /// Removes exactly the workout with `id`.
    ///
    /// # Errors
    /// - `AppError::WorkoutNotFound` for an unknown id.
    /// - `AppError::Storage` if persisting fails.
    pub fn delete_workout(&mut self, id: &str) -> Result<(), AppError> {
        let index = self.position_of(id)?;
        let mut workouts = self.state.workouts.clone();
        workouts.remove(index);
        self.commit(workouts)?;
        self.state.editing = None;

        info!(id, "Workout deleted");
        self.rerender();
        Ok(())
    }

    /// Drops every workout, in memory and in storage.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the stored list cannot be removed.
    pub fn reset(&mut self) -> Result<(), AppError> {
        storage::clear_workouts(self.storage.as_ref())?;
        self.state.workouts.clear();
        self.state.editing = None;
        self.state.pending_click = None;

        info!("All workouts cleared");
        self.rerender();
        Ok(())
    }

    /// Rebuilds the list and the markers from state.
    pub fn rerender(&mut self) {
        self.view.clear_workouts();
        if self.state.map_ready {
            self.map.clear_markers();
        }
        for workout in &self.state.workouts {
            self.view.render_workout(workout);
            if self.state.map_ready {
                render_marker(self.map.as_mut(), workout);
            }
        }
        self.view.set_reset_visible(!self.state.workouts.is_empty());
    }

    /// Writes `workouts` to storage, then makes it the in-memory list.
    /// State is untouched if the write fails.
    fn commit(&mut self, workouts: Vec<Workout>) -> Result<(), AppError> {
        storage::save_workouts(self.storage.as_ref(), &workouts)?;
        self.state.workouts = workouts;
        Ok(())
    }
}
