use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::document::{DEFAULT_DISPLAY_SCALE, DEFAULT_PROGRESS_EVERY, SessionConfig};
use crate::selection::DEFAULT_HIDE_DELAY;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagepick";

pub const MIN_DISPLAY_SCALE: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Display pixels per native document unit
    #[serde(default = "default_display_scale")]
    pub display_scale: f32,

    /// Publish render progress every N pages
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    #[serde(default = "default_hide_delay_ms")]
    pub overlay_hide_delay_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_display_scale() -> f32 {
    DEFAULT_DISPLAY_SCALE
}

fn default_progress_every() -> usize {
    DEFAULT_PROGRESS_EVERY
}

fn default_hide_delay_ms() -> u64 {
    DEFAULT_HIDE_DELAY.as_millis() as u64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            display_scale: default_display_scale(),
            progress_every: default_progress_every(),
            overlay_hide_delay_ms: default_hide_delay_ms(),
            export_dir: None,
        }
    }
}

impl Settings {
    /// Pull out-of-range values back to something the session can use
    fn clamp(&mut self) {
        if !self.display_scale.is_finite() || self.display_scale < MIN_DISPLAY_SCALE {
            warn!(
                "display_scale {} is out of range, using {MIN_DISPLAY_SCALE}",
                self.display_scale
            );
            self.display_scale = MIN_DISPLAY_SCALE;
        }
        if self.progress_every == 0 {
            warn!("progress_every must be at least 1");
            self.progress_every = 1;
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            scale: self.display_scale,
            progress_every: self.progress_every,
            hide_delay: Duration::from_millis(self.overlay_hide_delay_ms),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from `custom` or the default location into the global store.
///
/// A missing file is created with defaults. Unreadable or unparsable files are
/// logged and leave the defaults in place.
pub fn load_settings(custom: Option<&Path>) {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => match preferred_config_path() {
            Some(path) => path,
            None => {
                warn!("Could not determine config directory, using default settings");
                return;
            }
        },
    };

    let settings = if path.exists() {
        load_settings_from_path(&path)
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        let defaults = Settings::default();
        save_settings_to_file(&defaults, &path);
        defaults
    };

    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn load_settings_from_path(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            return Settings::default();
        }
    };

    match serde_yaml::from_str::<Settings>(&content) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");

            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, path);
            }
            settings.clamp();
            settings
        }
        Err(e) => {
            error!("Failed to parse settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Future migrations go here:
    // if settings.version < 2 {
    //     migrate_v1_to_v2(settings);
    // }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = match serde_yaml::to_string(settings) {
        Ok(yaml) => format!("{SETTINGS_HEADER}{yaml}"),
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# pagepick settings
#
# display_scale:         display pixels per PDF point (minimum 0.1)
# progress_every:        report render progress every N pages
# overlay_hide_delay_ms: how long a finished selection stays highlighted
# export_dir:            where rendered pages are written as PNG (optional)

"#;

// Public API for reading the loaded settings

pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_display_scale() -> f32 {
    SETTINGS
        .read()
        .map(|s| s.display_scale)
        .unwrap_or_else(|_| default_display_scale())
}

pub fn set_display_scale(scale: f32) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.display_scale = scale;
        settings.clamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_yaml::from_str("display_scale: 2.0\n").unwrap();
        assert_eq!(settings.display_scale, 2.0);
        assert_eq!(settings.progress_every, DEFAULT_PROGRESS_EVERY);
        assert_eq!(settings.overlay_hide_delay_ms, 2000);
        assert_eq!(settings.version, CURRENT_VERSION);
        assert!(settings.export_dir.is_none());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "display_scale: -3\nprogress_every: 0\n").unwrap();

        let settings = load_settings_from_path(&path);

        assert_eq!(settings.display_scale, MIN_DISPLAY_SCALE);
        assert_eq!(settings.progress_every, 1);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "display_scale: [not, a, number\n").unwrap();

        assert_eq!(load_settings_from_path(&path), Settings::default());
    }

    #[test]
    fn saved_settings_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let settings = Settings {
            display_scale: 2.5,
            export_dir: Some(PathBuf::from("/tmp/pages")),
            ..Settings::default()
        };

        save_settings_to_file(&settings, &path);

        assert_eq!(load_settings_from_path(&path), settings);
    }

    #[test]
    fn old_version_is_migrated_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\nprogress_every: 3\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.progress_every, 3);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains(&format!("version: {CURRENT_VERSION}")));
    }

    #[test]
    fn session_config_mirrors_settings() {
        let settings = Settings {
            display_scale: 2.0,
            progress_every: 7,
            overlay_hide_delay_ms: 500,
            ..Settings::default()
        };
        let config = settings.session_config();
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.progress_every, 7);
        assert_eq!(config.hide_delay, Duration::from_millis(500));
    }

    #[test]
    #[serial]
    fn missing_file_is_created_and_loaded_globally() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        load_settings(Some(&path));

        assert!(path.exists());
        assert_eq!(current(), Settings::default());
    }

    #[test]
    #[serial]
    fn global_scale_is_clamped_on_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "display_scale: 3.0\n").unwrap();

        load_settings(Some(&path));
        assert_eq!(get_display_scale(), 3.0);

        set_display_scale(0.0);
        assert_eq!(get_display_scale(), MIN_DISPLAY_SCALE);

        load_settings(Some(&path));
    }
}
