//src/map.rs
use serde::{Deserialize, Serialize};

use crate::workout::Coordinates;

pub const DEFAULT_ZOOM: u8 = 15;
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png";
pub const DEFAULT_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Map settings, stored in the `[map]` table of the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapSettings {
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupOptions {
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
    pub class_name: String,
}

impl PopupOptions {
    /// Marker popups stay open until the user closes them.
    pub fn sticky(class_name: impl Into<String>) -> Self {
        Self {
            max_width: 250,
            min_width: 100,
            auto_close: false,
            close_on_click: false,
            class_name: class_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanOptions {
    pub animate: bool,
    pub duration_secs: f64,
}

impl Default for PanOptions {
    fn default() -> Self {
        Self {
            animate: true,
            duration_secs: 1.0,
        }
    }
}

/// The map collaborator. Clicks on the map are fed back through
/// `App::handle_map_click`.
pub trait MapView {
    fn create_view(&mut self, center: Coordinates, zoom: u8);

    fn add_tile_layer(&mut self, url_template: &str, attribution: &str);

    fn set_view(&mut self, center: Coordinates, zoom: u8, options: PanOptions);

    /// Adds a marker with an already opened popup.
    fn add_marker(&mut self, coordinates: Coordinates, popup: &PopupOptions, content: &str);

    fn clear_markers(&mut self);
}
