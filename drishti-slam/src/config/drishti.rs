//! Main DrishtiConfig and conversion methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algorithms::features::FeatureConfig;
use crate::algorithms::localization::ParticleFilterConfig;
use crate::algorithms::mapping::VectorMapConfig;
use crate::algorithms::segmentation::SegmenterConfig;
use crate::core::types::LaserGeometry;
use crate::engine::PipelineConfig;
use crate::sensors::WheelOdometryConfig;
use crate::threads::PipelineThreadConfig;

use super::error::ConfigLoadError;
use super::sections::{OdometrySection, RuntimeSection, ScannerSection};

/// Full configuration loaded from YAML
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DrishtiConfig {
    /// Scanner geometry
    #[serde(default)]
    pub scanner: ScannerSection,

    /// Wheel odometry
    #[serde(default)]
    pub odometry: OdometrySection,

    /// Segmentation thresholds
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Observation uncertainty model
    #[serde(default)]
    pub features: FeatureConfig,

    /// Vector map fusion
    #[serde(default)]
    pub map: VectorMapConfig,

    /// Particle filter
    #[serde(default)]
    pub filter: ParticleFilterConfig,

    /// Worker thread
    #[serde(default)]
    pub runtime: RuntimeSection,
}

impl DrishtiConfig {
    /// Load and validate configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load from default config path (configs/drishti.yaml)
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/drishti.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a stage ill-defined.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let invalid = |msg: &str| -> Result<(), ConfigLoadError> {
            Err(ConfigLoadError::Invalid(msg.to_string()))
        };

        let s = &self.scanner;
        if s.distance_count < 2 {
            return invalid("scanner.distance_count must be at least 2");
        }
        if !s.angle_width.is_finite() || s.angle_width == 0.0 || !s.angle_start.is_finite() {
            return invalid("scanner angles must be finite with non-zero width");
        }
        if !(s.minimum_distance >= 0.0 && s.minimum_distance < s.maximum_distance) {
            return invalid("scanner distance band must satisfy 0 <= minimum < maximum");
        }

        if self.segmenter.min_segment_readings < 2 {
            return invalid("segmenter.min_segment_readings must be at least 2");
        }
        if self.segmenter.boundary_window == 0 || self.segmenter.corner_window == 0 {
            return invalid("segmenter windows must be positive");
        }

        if self.features.range_sigma <= 0.0 || self.features.angular_sigma < 0.0 {
            return invalid("features sigmas must be positive");
        }

        if self.map.match_radius <= 0.0 {
            return invalid("map.match_radius must be positive");
        }
        if self.map.region_stripes == 0 {
            return invalid("map.region_stripes must be positive");
        }
        if self.map.sweep_tolerance < 0.0 {
            return invalid("map.sweep_tolerance must be non-negative");
        }

        let f = &self.filter;
        if f.num_particles == 0 {
            return invalid("filter.num_particles must be positive");
        }
        if !(0.0..=1.0).contains(&f.resampling_threshold) {
            return invalid("filter.resampling_threshold must lie in [0, 1]");
        }
        if f.sensor.sigma_floor <= 0.0 || f.sensor.match_radius <= 0.0 {
            return invalid("filter.sensor sigma_floor and match_radius must be positive");
        }
        if !(f.sensor.sweep_mismatch_penalty > 0.0 && f.sensor.sweep_mismatch_penalty <= 1.0)
            || !(f.sensor.free_space_penalty > 0.0 && f.sensor.free_space_penalty <= 1.0)
        {
            return invalid("filter.sensor penalties must lie in (0, 1]");
        }
        Ok(())
    }

    /// Scanner geometry
    pub fn geometry(&self) -> LaserGeometry {
        self.scanner.to_geometry()
    }

    /// Wheel odometry config
    pub fn odometry_config(&self) -> WheelOdometryConfig {
        self.odometry.to_odometry_config()
    }

    /// Worker thread config
    pub fn thread_config(&self) -> PipelineThreadConfig {
        self.runtime.to_thread_config()
    }

    /// Convert to PipelineConfig
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            geometry: self.geometry(),
            segmenter: self.segmenter.clone(),
            features: self.features.clone(),
            map: self.map.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DrishtiConfig::default();
        assert_eq!(config.scanner.distance_count, 1081);
        assert_eq!(config.odometry.base_width, 0.4572);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = DrishtiConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = DrishtiConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.map.match_radius, config.map.match_radius);
        assert_eq!(parsed.filter.num_particles, config.filter.num_particles);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "filter:\n  num_particles: 64\n  seed: 9\nmap:\n  match_radius: 0.2\n";
        let config = DrishtiConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.filter.num_particles, 64);
        assert_eq!(config.filter.seed, 9);
        assert_eq!(config.map.match_radius, 0.2);
        assert_eq!(config.scanner.distance_count, 1081);
        assert_eq!(
            config.segmenter.min_segment_readings,
            SegmenterConfig::default().min_segment_readings
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = "scanner:\n  minimum_distance: 5.0\n  maximum_distance: 1.0\n";
        assert!(matches!(
            DrishtiConfig::from_yaml(yaml),
            Err(ConfigLoadError::Invalid(_))
        ));

        let yaml = "map:\n  region_stripes: 0\n";
        assert!(matches!(
            DrishtiConfig::from_yaml(yaml),
            Err(ConfigLoadError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            DrishtiConfig::from_yaml("filter: [1, 2"),
            Err(ConfigLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/drishti.yaml");
        let config = DrishtiConfig::load(&path).unwrap();
        let defaults = DrishtiConfig::default();
        assert_eq!(config.filter, defaults.filter);
        assert_eq!(config.map, defaults.map);
        assert_eq!(config.segmenter.min_segment_readings, 5);
        assert_eq!(config.geometry().distance_count, 1081);
        assert_eq!(config.thread_config(), PipelineThreadConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scanner:\n  distance_count: 721").unwrap();
        let config = DrishtiConfig::load(file.path()).unwrap();
        assert_eq!(config.geometry().distance_count, 721);

        let missing = DrishtiConfig::load(Path::new("/nonexistent/drishti.yaml"));
        assert!(matches!(missing, Err(ConfigLoadError::Io(_))));
    }
}
