use eyre::Result;
use std::{fs, path::PathBuf};

use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    filepath: PathBuf,
}

impl Config {
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        Self::load_from(prefix.join("configuration.json"))
    }

    pub fn load_from(filepath: PathBuf) -> Result<Self> {
        let mut settings = Settings::default();

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            if let Ok(user_settings) = serde_json::from_str::<Settings>(&config_str) {
                settings = user_settings;
            }
        }

        Ok(Self { settings, filepath })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.filepath.parent() {
            fs::create_dir_all(parent)?;
        }
        let config_json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.filepath, config_json)?;
        Ok(())
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        let path = PathBuf::from(config_home).join("lectern");
        return Ok(path);
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join("lectern");
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(".lectern"));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".lectern"));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}
