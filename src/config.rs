use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MemographConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Owner whose notes the CLI operates on.
    pub owner: String,
}

/// Force simulation tuning. Defaults reproduce the reference layout.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub link_distance: f64,
    pub min_link_distance: f64,
    pub max_link_distance: f64,
    /// Negative values repel.
    pub charge_strength: f64,
    pub charge_distance_min: f64,
    pub charge_distance_max: f64,
    pub collision_radius: f64,
    pub collision_strength: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
    pub velocity_decay: f64,
    /// Alpha target held while a node is being dragged.
    pub drag_alpha_target: f64,
    /// Alpha the simulation is reheated to after a viewport resize.
    pub resize_alpha: f64,
    pub tick_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Fraction of the viewport the fitted graph occupies.
    pub fit_margin: f64,
    pub fit_duration_ms: u64,
    /// Drop a dragged node's pin when the drag ends.
    pub release_pin_on_drag_end: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memograph_dir()
            .join("notes.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            owner: "local".into(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            min_link_distance: 50.0,
            max_link_distance: 200.0,
            charge_strength: -120.0,
            charge_distance_min: 1.0,
            charge_distance_max: 200.0,
            collision_radius: 25.0,
            collision_strength: 1.0,
            alpha_decay: 0.01,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            resize_alpha: 0.3,
            tick_interval_ms: 16,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            min_scale: 0.2,
            max_scale: 3.0,
            fit_margin: 0.9,
            fit_duration_ms: 750,
            release_pin_on_drag_end: true,
        }
    }
}

impl LayoutConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Clamp a requested link distance into the configured range.
    pub fn clamp_link_distance(&self, distance: f64) -> f64 {
        distance
            .max(self.min_link_distance)
            .min(self.max_link_distance)
    }

    fn validate(&self) -> Result<()> {
        let values = [
            ("link_distance", self.link_distance),
            ("min_link_distance", self.min_link_distance),
            ("max_link_distance", self.max_link_distance),
            ("charge_strength", self.charge_strength),
            ("charge_distance_min", self.charge_distance_min),
            ("charge_distance_max", self.charge_distance_max),
            ("collision_radius", self.collision_radius),
            ("collision_strength", self.collision_strength),
            ("alpha_min", self.alpha_min),
            ("drag_alpha_target", self.drag_alpha_target),
            ("resize_alpha", self.resize_alpha),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                bail!("layout.{name} must be finite, got {value}");
            }
        }
        if self.min_link_distance <= 0.0 || self.min_link_distance > self.max_link_distance {
            bail!(
                "layout link distance range {}..{} is empty or not positive",
                self.min_link_distance,
                self.max_link_distance
            );
        }
        if self.charge_distance_min > self.charge_distance_max {
            bail!(
                "layout charge distance range {}..{} is inverted",
                self.charge_distance_min,
                self.charge_distance_max
            );
        }
        for (name, value) in [
            ("alpha_decay", self.alpha_decay),
            ("velocity_decay", self.velocity_decay),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("layout.{name} must be within 0..=1, got {value}");
            }
        }
        Ok(())
    }
}

impl ViewportConfig {
    pub fn fit_duration(&self) -> Duration {
        Duration::from_millis(self.fit_duration_ms)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("fit_margin", self.fit_margin),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("viewport.{name} must be a positive number, got {value}");
            }
        }
        if self.min_scale > self.max_scale {
            bail!(
                "viewport.min_scale {} exceeds max_scale {}",
                self.min_scale,
                self.max_scale
            );
        }
        Ok(())
    }
}

/// Returns `~/.memograph/`, or `./.memograph` when there is no home directory.
pub fn default_memograph_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memograph")
}

/// Returns the default config file path: `~/.memograph/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memograph_dir().join("config.toml")
}

impl MemographConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemographConfig::default()
        };

        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Reject values the layout and viewport cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.viewport.validate()
    }

    /// Apply environment variable overrides
    /// (MEMOGRAPH_DB, MEMOGRAPH_OWNER, MEMOGRAPH_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMOGRAPH_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMOGRAPH_OWNER") {
            self.storage.owner = val;
        }
        if let Ok(val) = std::env::var("MEMOGRAPH_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MemographConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.owner, "local");
        assert_eq!(config.layout.link_distance, 100.0);
        assert_eq!(config.layout.charge_strength, -120.0);
        assert_eq!(config.viewport.min_scale, 0.2);
        assert_eq!(config.viewport.max_scale, 3.0);
        assert!(config.viewport.release_pin_on_drag_end);
        assert!(config.storage.db_path.ends_with("notes.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[logging]
level = "debug"

[storage]
db_path = "/tmp/test.db"
owner = "alice"

[layout]
link_distance = 150.0
alpha_decay = 0.02
"#;
        let config: MemographConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.storage.owner, "alice");
        assert_eq!(config.layout.link_distance, 150.0);
        assert_eq!(config.layout.alpha_decay, 0.02);
        // defaults still apply for unset fields
        assert_eq!(config.layout.collision_radius, 25.0);
        assert_eq!(config.viewport.fit_duration_ms, 750);
    }

    #[test]
    fn inverted_scale_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[viewport]\nmin_scale = 3.0\nmax_scale = 0.5\n",
        )
        .unwrap();

        let err = MemographConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("min_scale"));
    }

    #[test]
    fn out_of_range_layout_values_are_rejected() {
        let mut config = MemographConfig::default();
        assert!(config.validate().is_ok());

        config.layout.alpha_decay = 1.5;
        assert!(config.validate().is_err());

        config.layout = LayoutConfig {
            velocity_decay: -0.1,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        config.layout = LayoutConfig {
            min_link_distance: 300.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        config.layout = LayoutConfig {
            link_distance: f64::NAN,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        config.layout = LayoutConfig::default();
        config.viewport.min_scale = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn link_distance_is_clamped() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.clamp_link_distance(10.0), 50.0);
        assert_eq!(layout.clamp_link_distance(120.0), 120.0);
        assert_eq!(layout.clamp_link_distance(900.0), 200.0);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MemographConfig::default();
        std::env::set_var("MEMOGRAPH_DB", "/tmp/override.db");
        std::env::set_var("MEMOGRAPH_OWNER", "env-owner");
        std::env::set_var("MEMOGRAPH_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.storage.owner, "env-owner");
        assert_eq!(config.logging.level, "trace");

        // Clean up
        std::env::remove_var("MEMOGRAPH_DB");
        std::env::remove_var("MEMOGRAPH_OWNER");
        std::env::remove_var("MEMOGRAPH_LOG_LEVEL");
    }
}
