use crate::classify::{Bucket, PopulationScale};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

pub const CAPITALS_ENV: &str = "CAPITALS_FILEPATH";
pub const POPULATION_ENV: &str = "POPULATION_FILEPATH";
pub const LATITUDE_ENV: &str = "STARTING_POINT_LATITUDE";
pub const LONGITUDE_ENV: &str = "STARTING_POINT_LONGITUDE";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Contents of the optional TOML configuration file.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FileConfig {
    pub input: InputConfig,
    pub map: MapConfig,
    pub classification: Option<ClassificationConfig>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct InputConfig {
    pub capitals: Option<PathBuf>,
    pub population: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
    pub zoom_start: u8,
    pub tiles: TileConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            start_latitude: None,
            start_longitude: None,
            zoom_start: 5,
            tiles: TileConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TileConfig {
    pub url: String,
    pub attribution: String,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassificationConfig {
    pub buckets: Vec<Bucket>,
    pub overflow: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000, dir: None }
    }
}

impl FileConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Loads the file when one is given, otherwise all defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load_from_file)
    }
}

/// Values given on the command line or through the environment. They win
/// over the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub capitals: Option<PathBuf>,
    pub population: Option<PathBuf>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub log_level: Option<String>,
}

/// Fully resolved settings for one map build.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub capitals_filepath: PathBuf,
    pub population_filepath: PathBuf,
    pub output_map_filepath: PathBuf,
    pub starting_point_latitude: f64,
    pub starting_point_longitude: f64,
    pub zoom_start: u8,
    pub tiles: TileConfig,
    pub scale: PopulationScale,
    pub log_level: String,
}

impl AppConfig {
    pub fn resolve(file: FileConfig, overrides: Overrides, output: PathBuf) -> Result<Self> {
        let scale = match file.classification {
            Some(c) => PopulationScale::new(c.buckets, c.overflow)
                .context("Invalid [classification] table")?,
            None => PopulationScale::default(),
        };

        Ok(Self {
            capitals_filepath: required(overrides.capitals.or(file.input.capitals), CAPITALS_ENV)?,
            population_filepath: required(
                overrides.population.or(file.input.population),
                POPULATION_ENV,
            )?,
            output_map_filepath: output,
            starting_point_latitude: required(
                overrides.latitude.or(file.map.start_latitude),
                LATITUDE_ENV,
            )?,
            starting_point_longitude: required(
                overrides.longitude.or(file.map.start_longitude),
                LONGITUDE_ENV,
            )?,
            zoom_start: file.map.zoom_start,
            tiles: file.map.tiles,
            scale,
            log_level: overrides
                .log_level
                .or(file.logging.level)
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn required<T>(value: Option<T>, env: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("Missing setting: set {} or the matching config entry", env))
}

/// Loads `KEY=value` lines from an env file into the process environment.
/// Variables already set in the environment keep their values. With no
/// path, `.env` is looked up from the working directory and may be absent.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Err(e) if path.is_none() && e.not_found() => Ok(()),
        other => other.with_context(|| format!("Failed to load env file: {:?}", path)),
    }
}

/// Parses a configured log level, rejecting names tracing does not know.
pub fn level_filter(level: &str) -> Result<LevelFilter> {
    let directive = log_directive(level);
    LevelFilter::from_str(&directive).map_err(|_| anyhow!("Unknown log level: {:?}", level))
}

/// Turns a level name into a tracing filter directive. Accepts the
/// Python-style `WARNING` and `CRITICAL` spellings as well.
pub fn log_directive(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [input]
        capitals = "data/capitals.csv"
        population = "data/world.json"

        [map]
        start_latitude = 56.9
        start_longitude = 24.1
        zoom_start = 4

        [map.tiles]
        url = "https://tiles.example/{z}/{x}/{y}.png"
        attribution = "Example"

        [classification]
        overflow = "black"
        buckets = [
            { ceiling = 50, label = "white" },
            { ceiling = 10, label = "pink" },
        ]

        [logging]
        level = "DEBUG"

        [server]
        port = 8081
    "#;

    fn full_file() -> FileConfig {
        toml::from_str(FULL).unwrap()
    }

    #[test]
    fn resolves_from_file() {
        let config =
            AppConfig::resolve(full_file(), Overrides::default(), "out/map.html".into()).unwrap();

        assert_eq!(config.capitals_filepath, PathBuf::from("data/capitals.csv"));
        assert_eq!(config.population_filepath, PathBuf::from("data/world.json"));
        assert_eq!(config.output_map_filepath, PathBuf::from("out/map.html"));
        assert_eq!(config.starting_point_latitude, 56.9);
        assert_eq!(config.starting_point_longitude, 24.1);
        assert_eq!(config.zoom_start, 4);
        assert_eq!(config.tiles.attribution, "Example");
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.scale.classify(10.0), "white");
        assert_eq!(config.scale.classify(9.0), "pink");
        assert_eq!(config.scale.classify(50.0), "black");
    }

    #[test]
    fn overrides_win_over_file() {
        let overrides = Overrides {
            capitals: Some("other.csv".into()),
            latitude: Some(-33.9),
            log_level: Some("WARNING".into()),
            ..Default::default()
        };

        let config = AppConfig::resolve(full_file(), overrides, "map.html".into()).unwrap();

        assert_eq!(config.capitals_filepath, PathBuf::from("other.csv"));
        assert_eq!(config.population_filepath, PathBuf::from("data/world.json"));
        assert_eq!(config.starting_point_latitude, -33.9);
        assert_eq!(config.log_level, "WARNING");
    }

    #[test]
    fn defaults_without_file() {
        let overrides = Overrides {
            capitals: Some("c.csv".into()),
            population: Some("p.json".into()),
            latitude: Some(0.0),
            longitude: Some(0.0),
            log_level: None,
        };

        let config = AppConfig::resolve(FileConfig::default(), overrides, "m.html".into()).unwrap();

        assert_eq!(config.zoom_start, 5);
        assert_eq!(config.tiles, TileConfig::default());
        assert_eq!(config.scale, PopulationScale::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_required_setting_names_variable() {
        let overrides = Overrides {
            capitals: Some("c.csv".into()),
            population: Some("p.json".into()),
            latitude: Some(0.0),
            ..Default::default()
        };

        let err = AppConfig::resolve(FileConfig::default(), overrides, "m.html".into()).unwrap_err();

        assert!(err.to_string().contains(LONGITUDE_ENV));
    }

    #[test]
    fn invalid_classification_is_rejected() {
        let mut file = full_file();
        file.classification = Some(ClassificationConfig {
            buckets: vec![Bucket::new(1, "a"), Bucket::new(1, "b")],
            overflow: "c".into(),
        });

        assert!(AppConfig::resolve(file, Overrides::default(), "m.html".into()).is_err());
    }

    #[test]
    fn server_defaults() {
        assert_eq!(FileConfig::default().server.port, 3000);
        assert_eq!(full_file().server.port, 8081);
    }

    #[test]
    fn env_file_values_reach_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "WORLD_MAP_DRAWER_TEST_CAPITALS=from-dotenv.csv\n").unwrap();

        load_env_file(Some(&path)).unwrap();

        assert_eq!(
            std::env::var("WORLD_MAP_DRAWER_TEST_CAPITALS").unwrap(),
            "from-dotenv.csv"
        );
    }

    #[test]
    fn explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(Some(&dir.path().join("missing.env"))).is_err());
    }

    #[test]
    fn level_filter_rejects_unknown_levels() {
        assert_eq!(level_filter("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(level_filter("WARNING").unwrap(), LevelFilter::WARN);
        assert_eq!(level_filter("critical").unwrap(), LevelFilter::ERROR);
        let err = level_filter("verbose").unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn log_directive_accepts_python_names() {
        assert_eq!(log_directive("DEBUG"), "debug");
        assert_eq!(log_directive("WARNING"), "warn");
        assert_eq!(log_directive("critical"), "error");
        assert_eq!(log_directive("info"), "info");
    }
}
