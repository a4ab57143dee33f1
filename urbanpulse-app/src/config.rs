use anyhow::{anyhow, Context, Result};
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use urbanpulse_core::{
    dashboard::sequencer::SequencingPolicy,
    transport::{API_URL_ENV, DEFAULT_API_URL},
};
use urbanpulse_schemas::{
    camera::CameraMeta,
    file_formats::{CameraFile, DashboardFile},
};

pub const CAMERAS_ENV: &str = "URBANPULSE_CAMERAS";

/// Settings for one CLI invocation.
///
/// Layers, lowest first: built-in defaults, the `--config` YAML file, the
/// environment, then command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub sequencing: SequencingPolicy,
    /// A camera YAML file, or a directory of them, used instead of `/data/cameras`.
    pub cameras_file: Option<PathBuf>,
}

/// Values given on the command line. `None` leaves the lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub sequencing: Option<SequencingPolicy>,
    pub cameras_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            sequencing: SequencingPolicy::default(),
            cameras_file: None,
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_path {
            config.apply_file(path)?;
        }
        config.apply_env(|key| env::var(key).ok());
        config.apply_overrides(overrides);
        debug!(api_url = %config.api_url, sequencing = %config.sequencing, "Configuration resolved");
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let file: DashboardFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

        if let Some(url) = file.api_url {
            self.api_url = url;
        }
        if let Some(policy) = file.sequencing {
            self.sequencing = policy
                .parse()
                .map_err(|e: String| anyhow!(e))
                .with_context(|| format!("Invalid 'sequencing' in {:?}", path))?;
        }
        if let Some(cameras) = file.cameras_file {
            // Relative catalog paths are taken from the config file's directory.
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            self.cameras_file = Some(base.join(cameras));
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(cameras) = non_blank(CAMERAS_ENV) {
            self.cameras_file = Some(PathBuf::from(cameras));
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.api_url {
            self.api_url = url.clone();
        }
        if let Some(policy) = overrides.sequencing {
            self.sequencing = policy;
        }
        if let Some(cameras) = &overrides.cameras_file {
            self.cameras_file = Some(cameras.clone());
        }
    }

    /// Reads the offline camera catalog, if one is configured.
    pub fn load_cameras(&self) -> Result<Option<Vec<CameraMeta>>> {
        let Some(path) = &self.cameras_file else {
            return Ok(None);
        };
        info!("Loading camera catalog from {:?}", path);
        let cameras = load_yaml_files_into_map(
            path,
            |file: CameraFile| file.cameras,
            |item: &CameraMeta| item.camera_id.clone(),
        )?;
        info!("Camera catalog loaded: {} cameras.", cameras.len());
        Ok(Some(cameras.into_values().collect()))
    }
}

/// Loads a YAML file, or every YAML file in a directory, into a map.
///
/// Later files win when two entries share a key.
fn load_yaml_files_into_map<P, F, E, T, K>(
    path: P,
    extract_vec: E,
    get_key: K,
) -> Result<BTreeMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., CameraFile)
    E: Fn(F) -> Vec<T>,                  // Extracts the Vec<T> from the wrapper
    K: Fn(&T) -> String,                 // Key for the map
{
    let path = path.as_ref();
    let files = if path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {:?}", path))?
        {
            let file = entry?.path();
            if file.is_file() && file.extension().map_or(false, |s| s == "yaml" || s == "yml") {
                files.push(file);
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut map = BTreeMap::new();
    for file in files {
        let content = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {:?}", file))?;
        let file_wrapper: F = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", file))?;

        for item in extract_vec(file_wrapper) {
            map.insert(get_key(&item), item);
        }
    }
    Ok(map)
}
