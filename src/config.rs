// config.rs — viewer settings loaded from JSON

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gesture::{GestureTuning, DEFAULT_INERTIA};
use crate::mesh;
use crate::motion::{DEFAULT_QUEUE_CAPACITY, DEFAULT_SAMPLE_INTERVAL};
use crate::orientation::{OrientationBounds, DEFAULT_FOV};

/// Named inertia strengths offered by the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inertia {
    None,
    Short,
    Long,
}

impl Inertia {
    pub fn factor(self) -> f32 {
        match self {
            Inertia::None => 0.0,
            Inertia::Short => 0.1,
            Inertia::Long => 0.5,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Inertia::None => Inertia::Short,
            Inertia::Short => Inertia::Long,
            Inertia::Long => Inertia::None,
        }
    }

    /// Closest preset to a raw factor.
    pub fn nearest(factor: f32) -> Self {
        [Inertia::None, Inertia::Short, Inertia::Long]
            .into_iter()
            .min_by(|a, b| {
                let da = (a.factor() - factor).abs();
                let db = (b.factor() - factor).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(Inertia::None)
    }
}

/// Either a preset name or a raw factor in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InertiaSetting {
    Preset(Inertia),
    Factor(f32),
}

impl Default for InertiaSetting {
    fn default() -> Self {
        InertiaSetting::Factor(DEFAULT_INERTIA)
    }
}

impl InertiaSetting {
    pub fn factor(self) -> f32 {
        match self {
            InertiaSetting::Preset(p) => p.factor(),
            InertiaSetting::Factor(f) => f,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub radius: f32,
    pub divisions: usize,
    /// Radians.
    pub yaw_offset: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            divisions: 64,
            yaw_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialView {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: DEFAULT_FOV,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub inertia: InertiaSetting,
    pub gesture_control_enabled: bool,
    pub motion_control_enabled: bool,
    pub mesh: MeshConfig,
    pub bounds: OrientationBounds,
    pub initial: InitialView,
    pub gesture: GestureTuning,
    pub motion_interval_ms: u64,
    pub motion_queue_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            inertia: InertiaSetting::default(),
            gesture_control_enabled: true,
            motion_control_enabled: true,
            mesh: MeshConfig::default(),
            bounds: OrientationBounds::default(),
            initial: InitialView::default(),
            gesture: GestureTuning::default(),
            motion_interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
            motion_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let inertia = self.inertia.factor();
        if !(0.0..=1.0).contains(&inertia) {
            return Err(ConfigError::Validation(format!(
                "inertia must be within [0, 1], got {inertia}"
            )));
        }

        mesh::validate(self.mesh.radius, self.mesh.divisions, self.mesh.yaw_offset)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        self.bounds
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let g = &self.gesture;
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(g.pan_divisor_x) || !positive(g.pan_divisor_y) {
            return Err(ConfigError::Validation(
                "pan divisors must be positive".to_string(),
            ));
        }
        if !positive(g.pinch_expansion) || !positive(g.pinch_reduction) {
            return Err(ConfigError::Validation(
                "pinch factors must be positive".to_string(),
            ));
        }
        if g.inertia_interval_ms == 0 || g.inertia_ticks == 0 {
            return Err(ConfigError::Validation(
                "inertia interval and tick budget must be non-zero".to_string(),
            ));
        }
        if self.motion_interval_ms == 0 || self.motion_queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "motion interval and queue capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Config path from `--config <path>`, then PANORAMA_CONFIG.
    pub fn resolve_path_from_args() -> Option<PathBuf> {
        resolve_path(std::env::args(), std::env::var("PANORAMA_CONFIG").ok())
    }

    /// Loads the resolved config, falling back to defaults when there is
    /// none or it is unusable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::resolve_path_from_args() else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                log::info!(
                    "{}",
                    crate::i18n::tr_with("config.loaded", &[("path", path.display().to_string())])
                );
                config
            }
            Err(e) => {
                log::warn!(
                    "{}",
                    crate::i18n::tr_with(
                        "config.invalid",
                        &[("path", path.display().to_string()), ("err", e.to_string())]
                    )
                );
                Self::default()
            }
        }
    }
}

fn resolve_path(args: impl IntoIterator<Item = String>, env: Option<String>) -> Option<PathBuf> {
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        if a == "--config" {
            if let Some(v) = it.next() {
                return Some(PathBuf::from(v));
            }
        }
    }
    env.filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.inertia.factor(), 0.1);
    }

    #[test]
    fn preset_and_factor_inertia() {
        let config = ViewerConfig::from_json(r#"{ "inertia": "long" }"#).unwrap();
        assert_eq!(config.inertia, InertiaSetting::Preset(Inertia::Long));
        assert_eq!(config.inertia.factor(), 0.5);

        let config = ViewerConfig::from_json(r#"{ "inertia": 0.3 }"#).unwrap();
        assert_eq!(config.inertia.factor(), 0.3);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ViewerConfig::from_json(
            r#"{
                "motion_control_enabled": false,
                "mesh": { "divisions": 32 },
                "bounds": { "cyclic_yaw": true },
                "gesture": { "pan_divisor_x": 250.0 }
            }"#,
        )
        .unwrap();
        assert!(!config.motion_control_enabled);
        assert_eq!(config.mesh.divisions, 32);
        assert_eq!(config.mesh.radius, 10.0);
        assert!(config.bounds.cyclic_yaw);
        assert_eq!(config.bounds.fov, OrientationBounds::default().fov);
        assert_eq!(config.gesture.pan_divisor_x, 250.0);
        assert_eq!(config.gesture.pan_divisor_y, 500.0);
    }

    #[test]
    fn invalid_values_rejected() {
        for json in [
            r#"{ "inertia": 1.5 }"#,
            r#"{ "mesh": { "divisions": 7 } }"#,
            r#"{ "mesh": { "divisions": 18446744073709551614 } }"#,
            r#"{ "mesh": { "radius": 0.0 } }"#,
            r#"{ "bounds": { "pitch": { "min": 1.0, "max": -1.0 } } }"#,
            r#"{ "gesture": { "inertia_ticks": 0 } }"#,
            r#"{ "motion_queue_capacity": 0 }"#,
        ] {
            let err = ViewerConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)), "{json}: {err}");
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ViewerConfig::from_json("{ inertia: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ViewerConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn json_round_trip() {
        let config = ViewerConfig {
            inertia: InertiaSetting::Preset(Inertia::Short),
            ..Default::default()
        };
        let text = config.to_json().unwrap();
        assert_eq!(ViewerConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn presets_cycle_and_snap() {
        assert_eq!(Inertia::None.next(), Inertia::Short);
        assert_eq!(Inertia::Long.next(), Inertia::None);
        assert_eq!(Inertia::nearest(0.45), Inertia::Long);
        assert_eq!(Inertia::nearest(0.0), Inertia::None);
    }

    #[test]
    fn path_resolution_order() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            resolve_path(args(&["bin", "--config", "a.json"]), Some("b.json".into())),
            Some(PathBuf::from("a.json"))
        );
        assert_eq!(resolve_path(args(&["bin"]), Some("b.json".into())), Some(PathBuf::from("b.json")));
        assert_eq!(resolve_path(args(&["bin"]), None), None);
    }
}
