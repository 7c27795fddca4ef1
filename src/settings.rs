//! Settings management
//!
//! All tuning constants live in one XML document. Every section and field
//! is optional; anything missing takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::GestureTuning;
use crate::input::InputTuning;
use crate::rig::RigTuning;
use crate::tracking::TrackingSettings;

/// Application settings stored as XML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "GestureOrbitSettings", default)]
pub struct Settings {
    #[serde(rename = "gesture")]
    pub gesture: GestureTuning,

    #[serde(rename = "input")]
    pub input: InputTuning,

    #[serde(rename = "rig")]
    pub rig: RigTuning,

    #[serde(rename = "tracking")]
    pub tracking: TrackingSettings,

    /// Body selected at startup; empty selects nothing
    #[serde(rename = "initialSelection", default = "default_initial_selection")]
    pub initial_selection: String,

    /// Show the hand cursor mirrored, matching a selfie-view camera feed
    #[serde(rename = "mirrorCursor", default = "default_mirror_cursor")]
    pub mirror_cursor: bool,
}

fn default_initial_selection() -> String {
    "earth".to_string()
}

fn default_mirror_cursor() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gesture: GestureTuning::default(),
            input: InputTuning::default(),
            rig: RigTuning::default(),
            tracking: TrackingSettings::default(),
            initial_selection: default_initial_selection(),
            mirror_cursor: default_mirror_cursor(),
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("GestureOrbit");
            p.push("settings.xml");
            p
        })
    }

    /// Parse settings from an XML string
    pub fn from_xml_str(xml: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = from_str(xml).map_err(SettingsError::XmlParse)?;
        settings.validate();
        Ok(settings)
    }

    /// Load settings from an XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(SettingsError::Io)?;
        Self::from_xml_str(&contents)
    }

    /// Load from `path` (or the default location); a missing file gives defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let settings = Self::load_from_file(&path)?;
        tracing::info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Save settings to an XML file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }
        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
        fs::write(path, formatted).map_err(SettingsError::Io)?;
        Ok(())
    }

    /// Save to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to_file(&path)?;
        Ok(path)
    }

    /// Repair inconsistent values in every section
    pub fn validate(&mut self) {
        self.gesture.validate();
        self.input.validate();
        self.rig.validate();
        self.tracking.validate();
    }
}

/// Settings-related errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[source] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[source] quick_xml::SeError),
    #[error("Could not find config directory")]
    NoConfigDir,
}
