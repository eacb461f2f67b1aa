//! Configuration for the escrow simulator.

use alloy_primitives::Address;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tap_escrow::EscrowConfig;
use tap_types::config::LiteralOrEnv;
use tap_types::timestamp::UnixTimestamp;

/// CLI arguments for the escrow simulator.
#[derive(Parser, Debug)]
#[command(name = "tap-escrow-sim")]
#[command(about = "Replays scripted TAP escrow operations")]
pub struct CliArgs {
    /// Path to the JSON escrow configuration file
    #[arg(long, short, env = "CONFIG", default_value = "escrow.json")]
    pub config: PathBuf,
    /// Path to the JSON script of operations
    #[arg(long, short, env = "SCRIPT", default_value = "script.json")]
    pub script: PathBuf,
}

/// Escrow deployment as seen by the simulator.
///
/// Addresses accept `$VAR`/`${VAR}` references. Values not present in the file fall
/// back to environment variables, then to hardcoded defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "config_defaults::default_chain_id")]
    chain_id: u64,
    escrow: LiteralOrEnv<Address>,
    token: LiteralOrEnv<Address>,
    staking: LiteralOrEnv<Address>,
    verifier: LiteralOrEnv<Address>,
    allocation_tracker: LiteralOrEnv<Address>,
    #[serde(default = "config_defaults::default_withdraw_escrow_thawing_period")]
    withdraw_escrow_thawing_period: u64,
    #[serde(default = "config_defaults::default_revoke_signer_thawing_period")]
    revoke_signer_thawing_period: u64,
    /// Ledger time when the script starts, in seconds.
    #[serde(default)]
    start_time: Option<u64>,
}

pub mod config_defaults {
    use std::env;

    pub const DEFAULT_CHAIN_ID: u64 = 31337;
    pub const DEFAULT_THAWING_PERIOD: u64 = 3_600;

    /// Returns the default chain id with fallback: $CHAIN_ID env var -> 31337
    pub fn default_chain_id() -> u64 {
        env::var("CHAIN_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CHAIN_ID)
    }

    /// Returns the default withdraw thawing period with fallback:
    /// $WITHDRAW_ESCROW_THAWING_PERIOD env var -> 3600
    pub fn default_withdraw_escrow_thawing_period() -> u64 {
        env::var("WITHDRAW_ESCROW_THAWING_PERIOD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_THAWING_PERIOD)
    }

    /// Returns the default signer revocation thawing period with fallback:
    /// $REVOKE_SIGNER_THAWING_PERIOD env var -> 3600
    pub fn default_revoke_signer_thawing_period() -> u64 {
        env::var("REVOKE_SIGNER_THAWING_PERIOD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_THAWING_PERIOD)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse {0}: {1}")]
    JsonParse(PathBuf, serde_json::Error),
    #[error(transparent)]
    Escrow(#[from] tap_escrow::ConfigError),
}

/// Reads and parses the JSON file at `path`.
pub fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse(path.to_path_buf(), e))
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Config = load_json(path)?;
        config.escrow_config().validate()?;
        Ok(config)
    }

    pub fn escrow_config(&self) -> EscrowConfig {
        EscrowConfig {
            chain_id: self.chain_id,
            escrow: *self.escrow,
            token: *self.token,
            staking: *self.staking,
            verifier: *self.verifier,
            allocation_tracker: *self.allocation_tracker,
            withdraw_escrow_thawing_period: self.withdraw_escrow_thawing_period,
            revoke_signer_thawing_period: self.revoke_signer_thawing_period,
        }
    }

    /// Ledger start time: the configured value, or the wall clock.
    pub fn start_time(&self) -> UnixTimestamp {
        self.start_time
            .map(UnixTimestamp::from_secs)
            .unwrap_or_else(UnixTimestamp::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const CONFIG: &str = r#"{
        "chainId": 1337,
        "escrow": "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
        "token": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        "staking": "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9",
        "verifier": "0xDc64a140Aa3E981100a9becA4E685f962f0cF6C9",
        "allocationTracker": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
        "withdrawEscrowThawingPeriod": 60,
        "revokeSignerThawingPeriod": 120,
        "startTime": 1000
    }"#;

    #[test]
    fn test_parse_config() {
        let config: Config = serde_json::from_str(CONFIG).unwrap();
        let escrow_config = config.escrow_config();
        assert_eq!(escrow_config.chain_id, 1337);
        assert_eq!(
            escrow_config.allocation_tracker,
            address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512")
        );
        assert_eq!(escrow_config.withdraw_escrow_thawing_period, 60);
        assert_eq!(escrow_config.revoke_signer_thawing_period, 120);
        assert_eq!(config.start_time(), UnixTimestamp::from_secs(1000));
    }

    #[test]
    fn test_missing_address_is_an_error() {
        let json = r#"{ "escrow": "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0" }"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_load_rejects_long_thawing_period() {
        let path = std::env::temp_dir().join(format!(
            "tap-escrow-sim-config-{}.json",
            std::process::id()
        ));
        let json = CONFIG.replace("\"revokeSignerThawingPeriod\": 120", "\"revokeSignerThawingPeriod\": 99999999");
        fs::write(&path, json).unwrap();
        let result = Config::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(ConfigError::Escrow(
                tap_escrow::ConfigError::RevokeSignerThawingTooLong { .. }
            ))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }
}
