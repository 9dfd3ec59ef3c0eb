use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::pool::DEFAULT_SLOT_SIZE;
use crate::renderer::stats::DEFAULT_STATS_WINDOW;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Element capacity of a newly created transient buffer slot, unless a
    /// single allocation asks for more.
    #[serde(default = "RenderSettings::default_transient_slot_size")]
    pub transient_slot_size: u32,
    /// Upper bound on the texture units used, below what the device reports.
    #[serde(default)]
    pub max_texture_units: Option<u32>,
    /// Number of frames the frame rate is averaged over.
    #[serde(default = "RenderSettings::default_stats_window")]
    pub stats_window: usize,
    /// Query and log device errors after every pass and layer apply.
    #[serde(default = "RenderSettings::default_check_errors")]
    pub check_errors: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            transient_slot_size: Self::default_transient_slot_size(),
            max_texture_units: None,
            stats_window: Self::default_stats_window(),
            check_errors: Self::default_check_errors(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    /// Parses and validates settings from a JSON document.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let settings = serde_json::from_str::<RenderSettings>(contents)?;
        info!("Loaded render settings");
        Ok(settings.validate())
    }

    pub fn validate(mut self) -> Self {
        if self.transient_slot_size == 0 {
            warn!("Transient slot size must be greater than zero. Using default value.");
            self.transient_slot_size = Self::default_transient_slot_size();
        }

        if self.max_texture_units == Some(0) {
            warn!("Texture unit limit must be greater than zero. Ignoring it.");
            self.max_texture_units = None;
        }

        if self.stats_window == 0 {
            warn!("Stats window must be greater than zero. Using default value.");
            self.stats_window = Self::default_stats_window();
        }

        self
    }

    const fn default_transient_slot_size() -> u32 {
        DEFAULT_SLOT_SIZE
    }

    const fn default_stats_window() -> usize {
        DEFAULT_STATS_WINDOW
    }

    const fn default_check_errors() -> bool {
        true
    }
}
