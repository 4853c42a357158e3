use serde::{Deserialize, Serialize};

/// Host-tunable editor parameters, sent as a JSON object with the `init` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Overlay left edge (viewport pixels) right after a logo upload.
    pub initial_left: f64,
    /// Overlay top edge (viewport pixels) right after a logo upload.
    pub initial_top: f64,
    pub initial_width: f64,
    pub initial_height: f64,
    /// Lower bound for overlay width and height while resizing.
    pub min_overlay_size: f64,
    /// File name written by `pdf_export`.
    pub download_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            initial_left: 200.0,
            initial_top: 200.0,
            initial_width: 100.0,
            initial_height: 100.0,
            min_overlay_size: 8.0,
            download_name: "modified.pdf".to_string(),
        }
    }
}

impl EditorConfig {
    /// Build a config from a host-supplied JSON value, falling back to defaults.
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<EditorConfig>(value) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                log::warn!("Failed to parse editor config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.min_overlay_size.is_finite() && self.min_overlay_size > 0.0) {
            log::warn!(
                "Ignoring min_overlay_size {}, using {}",
                self.min_overlay_size,
                defaults.min_overlay_size
            );
            self.min_overlay_size = defaults.min_overlay_size;
        }
        if self.initial_width < self.min_overlay_size {
            self.initial_width = self.min_overlay_size;
        }
        if self.initial_height < self.min_overlay_size {
            self.initial_height = self.min_overlay_size;
        }
        if self.download_name.trim().is_empty() || self.download_name.contains(['/', '\\']) {
            log::warn!("Ignoring download_name {:?}", self.download_name);
            self.download_name = defaults.download_name;
        }
        self
    }
}
