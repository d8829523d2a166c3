use crate::model::TimeUnit;
use crate::timer::{CountdownPolicy, TimerSettings, DEFAULT_COUNTDOWN_SECS};
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROJECT_DIR: &str = ".focus";
const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown every task starts from under the reset policy, and the
    /// value the countdown returns to after each transition.
    pub default_countdown_secs: u64,
    pub countdown_policy: CountdownPolicy,
    pub tick_interval_ms: u64,
    /// Unit preselected in a fresh form.
    pub default_unit: TimeUnit,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_countdown_secs: DEFAULT_COUNTDOWN_SECS,
            countdown_policy: CountdownPolicy::ResetToDefault,
            tick_interval_ms: 1000,
            default_unit: TimeUnit::Second,
        }
    }
}

impl Config {
    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            default_secs: self.default_countdown_secs,
            default_unit: self.default_unit,
            policy: self.countdown_policy,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Explicit,
    Project,
    Global,
}

impl ConfigScope {
    pub fn label(&self) -> &'static str {
        match self {
            ConfigScope::Explicit => "explicit",
            ConfigScope::Project => "project",
            ConfigScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub scope: ConfigScope,
}

/// Writes a default project config under `dir`, leaving an existing one alone.
pub fn init_project_config(dir: &Path) -> Result<ConfigLocation> {
    let project_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&project_dir)
        .with_context(|| format!("failed to create {:?}", project_dir))?;
    let location = ConfigLocation {
        path: project_dir.join(CONFIG_FILE),
        scope: ConfigScope::Project,
    };
    if !location.path.exists() {
        save_config(&location, &Config::default())?;
    }
    Ok(location)
}

pub fn locate_config(start: &Path, explicit: Option<PathBuf>) -> Result<ConfigLocation> {
    if let Some(path) = explicit {
        return Ok(ConfigLocation {
            path,
            scope: ConfigScope::Explicit,
        });
    }
    if let Some(project_path) = find_project_config(start) {
        return Ok(ConfigLocation {
            path: project_path,
            scope: ConfigScope::Project,
        });
    }
    Ok(ConfigLocation {
        path: project_dirs()?.config_dir().join(CONFIG_FILE),
        scope: ConfigScope::Global,
    })
}

/// Reads the config at `location`. A missing file means defaults, except for
/// an explicitly requested path.
pub fn load_config(location: &ConfigLocation) -> Result<Config> {
    if !location.path.exists() {
        if location.scope == ConfigScope::Explicit {
            bail!("config file {:?} does not exist", location.path);
        }
        return Ok(Config::default());
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing config file {:?}", location.path))?;
    config
        .validate()
        .with_context(|| format!("invalid config in {:?}", location.path))?;
    Ok(config)
}

pub fn save_config(location: &ConfigLocation, config: &Config) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

pub fn to_yaml(config: &Config) -> Result<String> {
    serde_yaml::to_string(config).context("serializing config")
}

/// Directory the terminal UI writes its log file to.
pub fn log_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "focus").context("locating config directory")
}
