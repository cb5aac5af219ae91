//! Configuration management for the eNodeB ACS daemon

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcsConfig {
    pub general: GeneralConfig,
    pub timers: TimerConfig,
    pub operator: OperatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub node_id: String,
    pub description: String,
    pub listen_address: String,
    pub listen_port: u16,
    pub periodic_inform_interval: u32,
}

/// Timer durations, in seconds. Defaults match spec.md §6's constants but
/// are overridable per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    pub rem_wait_timeout: u64,
    pub reboot_inform_timeout: u64,
    pub post_reboot_settle: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            rem_wait_timeout: 600,
            reboot_inform_timeout: 300,
            post_reboot_settle: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub plmns: Vec<PlmnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlmnConfig {
    pub plmnid: String,
    pub enable: bool,
    pub cell_reserved: bool,
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub max_size: u64,
    pub max_files: u32,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "compact")]
    Compact,
    #[serde(rename = "full")]
    Full,
}

impl AcsConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AcsConfig = toml::from_str(&contents)
            .map_err(|e| Error::parse(format!("Invalid TOML: {}", e)))?;
        Ok(config)
    }

    pub fn load_from_env() -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = settings.add_source(
            config::Environment::with_prefix("ACS").separator("_"),
        );

        let config = settings.build()?;
        let acs_config = config.try_deserialize()?;
        Ok(acs_config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.listen_port == 0 {
            return Err(Error::parse("Invalid listen port"));
        }

        if self.timers.rem_wait_timeout == 0 {
            return Err(Error::parse("rem_wait_timeout must be non-zero"));
        }

        if self.timers.reboot_inform_timeout == 0 {
            return Err(Error::parse("reboot_inform_timeout must be non-zero"));
        }

        for plmn in &self.operator.plmns {
            if plmn.plmnid.is_empty() {
                return Err(Error::parse("PLMN id must not be empty"));
            }
        }

        Ok(())
    }

    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig {
                node_id: "enodeb-acsd-1".to_string(),
                description: "eNodeB TR-069 auto-configuration server".to_string(),
                listen_address: "0.0.0.0".to_string(),
                listen_port: 48080,
                periodic_inform_interval: 300,
            },
            timers: TimerConfig::default(),
            operator: OperatorConfig {
                plmns: vec![PlmnConfig {
                    plmnid: "001010".to_string(),
                    enable: true,
                    cell_reserved: false,
                    primary: true,
                }],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("/var/log/enodeb-acsd.log".to_string()),
                max_size: 100 * 1024 * 1024,
                max_files: 10,
                format: LogFormat::Json,
            },
        }
    }
}
