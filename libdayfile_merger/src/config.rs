use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{COMPONENTS, DAYFILE_DIR_NAME};
use super::error::ConfigError;
use super::station_config::StationConfig;

/// Structure representing the application configuration. Contains pathing and sampling information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub sampling_interval: Option<f64>,
    pub station_name: Option<String>,
    pub station_config_path: Option<PathBuf>,
    pub components: Vec<String>,
    pub skip_malformed_names: bool,
    pub n_threads: i32,
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("None"),
            output_path: None,
            sampling_interval: None,
            station_name: None,
            station_config_path: None,
            components: COMPONENTS.iter().map(|c| c.to_string()).collect(),
            skip_malformed_names: false,
            n_threads: 1,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check the parts of the configuration that do not depend on the data
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.components.is_empty() {
            return Err(ConfigError::NoComponents);
        }
        for component in self.components.iter() {
            if !COMPONENTS.contains(&component.to_lowercase().as_str()) {
                return Err(ConfigError::UnknownComponent(component.clone()));
            }
        }
        if let Some(dt) = self.sampling_interval {
            if !(dt > 0.0 && dt.is_finite()) {
                return Err(ConfigError::InvalidSamplingInterval(dt));
            }
        }
        Ok(())
    }

    /// Get the directory day-files are written to
    pub fn get_output_directory(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self.source_path.join(DAYFILE_DIR_NAME),
        }
    }

    /// Load the station configuration, if one is set
    pub fn load_station_config(&self) -> Result<Option<StationConfig>, ConfigError> {
        match &self.station_config_path {
            Some(path) => Ok(Some(StationConfig::read_config_file(path)?)),
            None => Ok(None),
        }
    }

    /// Station name to write, preferring the configured override over the one from the filenames
    pub fn get_station_name(&self, from_filename: &str) -> String {
        match &self.station_name {
            Some(name) => name.clone(),
            None => from_filename.to_string(),
        }
    }

    /// Sampling interval for a station
    ///
    /// The configured interval wins; otherwise it is looked up in the station configuration.
    pub fn resolve_sampling_interval(
        &self,
        station: &str,
        station_config: Option<&StationConfig>,
    ) -> Result<f64, ConfigError> {
        if let Some(dt) = self.sampling_interval {
            return Ok(dt);
        }
        let stations = match station_config {
            Some(s) => s,
            None => return Err(ConfigError::MissingSamplingInterval(station.to_string())),
        };
        match stations.get(station) {
            Some(metadata) => Ok(metadata.sampling_interval),
            None => Err(ConfigError::UnknownStation(station.to_string())),
        }
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str(
            "source_path: /data/pb01\nsampling_interval: 0.5\ncomponents: [ex, BX]\n",
        )
        .unwrap();
        assert_eq!(config.source_path, PathBuf::from("/data/pb01"));
        assert_eq!(config.n_threads, 1);
        assert!(!config.skip_malformed_names);
        assert_eq!(
            config.get_output_directory(),
            PathBuf::from("/data/pb01/dayfiles")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_round_trip() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.components.len(), COMPONENTS.len());
        assert!(config.is_n_threads_valid());
    }

    #[test]
    fn test_validation() {
        let mut config = Config {
            components: vec![String::from("zz")],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownComponent(_))
        ));
        config.components.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoComponents)));
        config.components = vec![String::from("ex")];
        config.sampling_interval = Some(0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSamplingInterval(_))
        ));
    }

    #[test]
    fn test_sampling_interval_resolution() {
        let stations: StationConfig = "[pb01]
lat = 1
lon = 2
ele = 3
sampling_interval = 0.25
station_type = b
b_logger_type = edl
b_logger_gain = 1
b_instrument_type = coil
b_instrument_amplification = 1
"
        .parse()
        .unwrap();

        let mut config = Config::default();
        assert_eq!(
            config
                .resolve_sampling_interval("PB01", Some(&stations))
                .unwrap(),
            0.25
        );
        assert!(matches!(
            config.resolve_sampling_interval("PB02", Some(&stations)),
            Err(ConfigError::UnknownStation(_))
        ));
        assert!(matches!(
            config.resolve_sampling_interval("PB01", None),
            Err(ConfigError::MissingSamplingInterval(_))
        ));
        config.sampling_interval = Some(0.1);
        assert_eq!(config.resolve_sampling_interval("PB02", None).unwrap(), 0.1);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::read_config_file(Path::new("/definitely/not/here.yml")),
            Err(ConfigError::BadFilePath(_))
        ));
    }
}
