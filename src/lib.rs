use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

// --- Declare modules ---
pub mod app;
mod config;
pub mod form;
pub mod geolocation;
pub mod map;
pub mod storage;
pub mod view;
pub mod workout;

// --- Expose public types ---
pub use app::{App, AppError, AppState, GEOLOCATION_ALERT};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, StandardColor, Theme, Units,
};
pub use form::{coerce_number, FormError, WorkoutForm, WorkoutInput};
pub use geolocation::{FixedLocation, Geolocation, GeolocationError};
pub use map::{MapSettings, MapView, PanOptions, PopupOptions, DEFAULT_ZOOM};
pub use storage::{
    get_storage_path as get_storage_path_util, MemoryStorage, SqliteStorage, StorageBackend,
    StorageError, WORKOUTS_KEY,
};
pub use view::{ListTarget, WorkoutView};
pub use workout::{Coordinates, Workout, WorkoutError, WorkoutKind, WorkoutType};

pub const KM_TO_MILE: f64 = 0.621_371;
pub const M_TO_FT: f64 = 3.280_84;

pub struct AppService {
    pub config: Config,
    pub app: App,
    pub storage_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Loads config, opens the storage file and reads the saved workouts.
    /// # Errors
    /// Returns `anyhow::Error` if config/storage path determination, loading, or parsing fails.
    pub fn initialize(map: Box<dyn MapView>, view: Box<dyn WorkoutView>) -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let storage_path =
            storage::get_storage_path().context("Failed to determine storage path")?;
        let storage = SqliteStorage::open(&storage_path)
            .with_context(|| format!("Failed to open storage at {storage_path:?}"))?;

        let mut app = App::new(config.map.clone(), Box::new(storage), map, view);
        let count = app
            .load()
            .with_context(|| format!("Failed to read saved workouts from {storage_path:?}"))?;
        info!(count, path = %storage_path.display(), "Storage opened");

        Ok(Self {
            config,
            app,
            storage_path,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the position used as the map's starting point.
    /// # Errors
    /// - `ConfigError::InvalidHome` if the position is out of range.
    /// - `ConfigError` variants if saving fails.
    pub fn set_home(&mut self, home: Coordinates) -> Result<(), ConfigError> {
        self.config.set_home(home)?;
        self.save_config()
    }

    /// Sets the zoom level used when the map is created or re-centred.
    /// Takes effect on the next start.
    /// # Errors
    /// - `ConfigError::InvalidZoom` above the highest tile zoom level.
    /// - `ConfigError` variants if saving fails.
    pub fn set_zoom(&mut self, zoom: u8) -> Result<(), ConfigError> {
        self.config.set_zoom(zoom)?;
        self.save_config()
    }

    /// Sets the display units.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    /// Geolocation backed by the configured home position.
    pub const fn geolocation(&self) -> FixedLocation {
        FixedLocation(self.config.home)
    }
}
