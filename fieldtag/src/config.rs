/// Rig setup files: camera calibration, mount, and field in one TOML.
///
/// The constants that used to sit at the top of every capture script
/// (intrinsics, distortion vector, camera position and attitude, field
/// dimensions) live here instead.
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::camera::{Camera, Distortion, Intrinsics};
use crate::field::FieldMap;
use crate::locate::FieldLocator;
use crate::math::Vec3;
use crate::mount::CameraMount;
use crate::rotation::EulerDeg;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    #[error("unknown field preset '{0}'")]
    UnknownPreset(String),

    #[error("field preset 'square' requires a side length")]
    MissingSide,
}

/// Top-level setup file.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupConfig {
    pub camera: CameraConfig,
    pub mount: MountConfig,
    pub field: FieldConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    #[serde(default)]
    pub distortion: Distortion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MountConfig {
    /// Optical center in the field frame, mm.
    pub position: [f64; 3],
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// "contest" or "square".
    pub preset: String,
    /// Side length for the "square" preset, mm.
    #[serde(default)]
    pub side: Option<f64>,
    /// Height of the tag plane above the floor, mm.
    #[serde(default)]
    pub tag_height: f64,
}

impl SetupConfig {
    pub fn from_toml_str(s: &str) -> Result<SetupConfig, ConfigError> {
        let config: SetupConfig = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<SetupConfig, ConfigError> {
        SetupConfig::from_toml_str(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.fx <= 0.0 || self.camera.fy <= 0.0 {
            return Err(ConfigError::InvalidCamera(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.camera.fx, self.camera.fy
            )));
        }
        Ok(())
    }

    pub fn camera(&self) -> Camera {
        Camera::with_distortion(
            Intrinsics::new(self.camera.fx, self.camera.fy, self.camera.cx, self.camera.cy),
            self.camera.distortion,
        )
    }

    pub fn mount(&self) -> CameraMount {
        CameraMount::new(
            Vec3::from_array(self.mount.position),
            EulerDeg::new(self.mount.yaw, self.mount.pitch, self.mount.roll),
        )
    }

    pub fn field(&self) -> Result<FieldMap, ConfigError> {
        match self.field.preset.as_str() {
            "contest" => Ok(FieldMap::contest()),
            "square" => {
                let side = self.field.side.ok_or(ConfigError::MissingSide)?;
                if side <= 0.0 {
                    return Err(ConfigError::Parse(format!(
                        "square side must be positive, got {side}"
                    )));
                }
                Ok(FieldMap::square(side))
            }
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    /// Assemble the full locator described by this setup.
    pub fn build_locator(&self) -> Result<FieldLocator, ConfigError> {
        Ok(
            FieldLocator::new(self.camera(), self.mount(), self.field()?)
                .with_tag_height(self.field.tag_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        [camera]
        fx = 1194.08741
        fy = 1206.03102
        cx = 602.932566
        cy = 325.538922

        [camera.distortion]
        k1 = 0.04022942
        p1 = -0.00922231

        [mount]
        position = [250.0, -200.0, 800.0]
        pitch = -60.0
        roll = 180.0

        [field]
        preset = "square"
        side = 500.0
        tag_height = 25.0
    "#;

    #[test]
    fn parses_full_setup() {
        let config = SetupConfig::from_toml_str(EXAMPLE).unwrap();
        assert!((config.camera.fx - 1194.08741).abs() < 1e-9);
        assert!((config.camera.distortion.k1 - 0.04022942).abs() < 1e-9);
        assert_eq!(config.camera.distortion.k2, 0.0, "unlisted coeffs default");
        assert_eq!(config.mount.yaw, 0.0);
        assert_eq!(config.field.tag_height, 25.0);
    }

    #[test]
    fn builds_locator() {
        let config = SetupConfig::from_toml_str(EXAMPLE).unwrap();
        let locator = config.build_locator().unwrap();
        assert_eq!(locator.tag_height, 25.0);
        assert!((locator.mount.position.z - 800.0).abs() < 1e-9);
        assert!((locator.field.width - 500.0).abs() < 1e-9);
    }

    #[test]
    fn distortion_table_is_optional() {
        let toml = r#"
            [camera]
            fx = 600.0
            fy = 600.0
            cx = 320.0
            cy = 240.0

            [mount]
            position = [0.0, 0.0, 900.0]
            roll = 180.0

            [field]
            preset = "contest"
        "#;
        let config = SetupConfig::from_toml_str(toml).unwrap();
        assert!(config.camera.distortion.is_none());
        assert_eq!(config.field().unwrap().name, "contest");
    }

    #[test]
    fn rejects_nonpositive_focal_length() {
        let toml = EXAMPLE.replace("fx = 1194.08741", "fx = 0.0");
        match SetupConfig::from_toml_str(&toml) {
            Err(ConfigError::InvalidCamera(msg)) => assert!(msg.contains("fx=0")),
            other => panic!("expected InvalidCamera, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_preset() {
        let toml = EXAMPLE.replace("\"square\"", "\"hexagon\"");
        let config = SetupConfig::from_toml_str(&toml).unwrap();
        match config.field() {
            Err(ConfigError::UnknownPreset(p)) => assert_eq!(p, "hexagon"),
            other => panic!("expected UnknownPreset, got {other:?}"),
        }
    }

    #[test]
    fn square_preset_requires_side() {
        let toml = EXAMPLE.replace("side = 500.0", "");
        let config = SetupConfig::from_toml_str(&toml).unwrap();
        assert!(matches!(config.field(), Err(ConfigError::MissingSide)));
    }

    #[test]
    fn garbage_toml_is_a_parse_error() {
        assert!(matches!(
            SetupConfig::from_toml_str("not = [valid"),
            Err(ConfigError::Parse(_))
        ));
    }
}
