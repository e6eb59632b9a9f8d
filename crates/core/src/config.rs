use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use ini::{Ini, Properties};
use tokio::fs::try_exists;

use crate::{
    cloud_provider::CloudProviderName,
    error::{ConfigurationError, Result},
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 11;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(180);

/// Timers of a single termination attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationSettings {
    pub poll_interval: Duration,
    pub deadline: Duration,
}

impl Default for TerminationSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl TerminationSettings {
    pub fn new(poll_interval: Duration, deadline: Duration) -> Result<Self> {
        let settings = Self {
            poll_interval,
            deadline,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval_secs", "must be greater than zero"));
        }
        if self.deadline <= self.poll_interval {
            return Err(invalid(
                "deadline_secs",
                "must be longer than the poll interval",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub provider: CloudProviderName,
    pub region: Option<String>,
    /// Total attempts per provider call, first try included.
    pub max_attempts: u32,
    pub termination: TerminationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: CloudProviderName::Aws,
            region: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            termination: TerminationSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_ini(config: &Ini) -> Result<Self> {
        let mut settings = Settings::default();

        let general = config.general_section();
        if let Some(provider) = general.get("provider") {
            settings.provider = CloudProviderName::from_str(provider)?;
        }
        settings.region = general
            .get("region")
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .map(ToString::to_string);

        if let Some(section) = config.section(Some("provider")) {
            if let Some(max_attempts) = parse_number::<u32>(section, "max_attempts")? {
                settings.max_attempts = max_attempts;
            }
        }

        if let Some(section) = config.section(Some("termination")) {
            if let Some(secs) = parse_number::<u64>(section, "poll_interval_secs")? {
                settings.termination.poll_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = parse_number::<u64>(section, "deadline_secs")? {
                settings.termination.deadline = Duration::from_secs(secs);
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config = Ini::load_from_file(path).map_err(|error| ConfigurationError::InvalidFile {
            reason: format!("{}: {}", path.display(), error),
        })?;
        Self::from_ini(&config)
    }

    /// Reads `~/.decommission/config`, falling back to defaults when the file
    /// does not exist.
    pub async fn load_default() -> Result<Self> {
        let path = default_config_path()?;
        if !try_exists(&path).await? {
            return Ok(Settings::default());
        }
        Self::load_from_file(&path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        self.termination.validate()
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(ConfigurationError::HomeDirectoryNotAvailable)?;
    Ok(home_dir.join(".decommission").join("config"))
}

fn parse_number<T: FromStr>(section: &Properties, field: &str) -> Result<Option<T>> {
    let Some(raw) = section.get(field) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| invalid(field, &format!("`{raw}` is not a valid number")))
}

fn invalid(field: &str, reason: &str) -> crate::error::Error {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
