use crate::error::{AssignmeError, Result};
use crate::github::Credential;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SNAPSHOT: &str = "team.json";

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    pub org: Option<String>,
    pub snapshot: Option<PathBuf>,
}

impl Config {
    /// Resolves the credential: an explicit file wins over the stored token,
    /// which wins over `auth.token_file`.
    pub fn credential(&self, token_file: Option<&Path>) -> Result<Credential> {
        if let Some(path) = token_file {
            return Credential::from_file(path);
        }
        if let Some(token) = self.auth.token.as_deref() {
            return Ok(Credential::new(token));
        }
        match self.auth.token_file.as_deref() {
            Some(path) => Credential::from_file(path),
            None => Err(AssignmeError::NotAuthenticated),
        }
    }

    pub fn org(&self, org_flag: Option<&str>) -> Result<String> {
        org_flag
            .or(self.defaults.org.as_deref())
            .map(str::to_string)
            .ok_or(AssignmeError::NoOrganization)
    }

    pub fn snapshot_path(&self, snapshot_flag: Option<&Path>) -> PathBuf {
        snapshot_flag
            .or(self.defaults.snapshot.as_deref())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT))
    }
}

pub fn config_path() -> Result<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join("assignme").join("config.toml");
        return Ok(path);
    }

    let home = dirs::home_dir()
        .ok_or_else(|| AssignmeError::Config("Cannot find home directory".into()))?;
    Ok(home.join(".config").join("assignme").join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    fs::write(&path, &contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}
