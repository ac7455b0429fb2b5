//! # Configuration
//!
//! Probe configuration loading and resolution.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values
//! 2. Configuration file (`RPC_PROBE_CONFIG_FILE`, default `rpc-probe.toml`, if it exists)
//! 3. Environment variables (prefixed with `RPC_PROBE_`, plus `MNEMONIC`).
//!    The binary loads `.env` into the environment first.
//! 4. Command-line flags, applied by the binary
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_PROBE_NETWORK` | Network name or chain id | `base` |
//! | `RPC_PROBE_RPC_URL` | RPC endpoint override | network default |
//! | `RPC_PROBE_TOKEN` | Token address override | network USDC |
//! | `MNEMONIC` / `RPC_PROBE_MNEMONIC` | Seed phrase for signing | none |
//! | `RPC_PROBE_ACCOUNT_INDEX` | Derivation index | `0` |
//! | `RPC_PROBE_ADDRESS` | Read-only address | none |
//! | `RPC_PROBE_AMOUNT` | Transfer amount | `0.01` |
//! | `RPC_PROBE_RECIPIENT` | Transfer recipient | sender |
//! | `RPC_PROBE_SEND` | Submit the transfer | `false` |
//! | `RPC_PROBE_ACCESS_LIST_GAS_LIMIT` | Gas sent with `eth_createAccessList` | none |
//! | `RPC_PROBE_REQUEST_TIMEOUT_MS` | Per-request timeout | `30000` |
//! | `RPC_PROBE_POLL_INTERVAL_MS` | Receipt poll interval | `2000` |
//! | `RPC_PROBE_RECEIPT_TIMEOUT_MS` | Receipt deadline | `120000` |
//! | `RPC_PROBE_GAS_BUFFER_PERCENT` | Gas estimate padding | `20` |
//! | `RPC_PROBE_IMPLAUSIBLE_GAS_COST_WEI` | Misestimation threshold | `10^18` |
//! | `RPC_PROBE_LOG_LEVEL` | Log level | `info` |
//! | `RPC_PROBE_LOG_FORMAT` | Log format (json/pretty) | `pretty` |
//!
//! # Examples
//!
//! ```ignore
//! use rpc_probe::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! println!("probing {} at {}", config.network()?, config.rpc_url()?);
//! ```

use crate::domain::value_objects::{Account, AccountError, Network, parse_address};
use crate::infrastructure::blockchain::GasMisestimationPolicy;
use crate::infrastructure::blockchain::transport::parse_endpoint;
use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "RPC_PROBE_CONFIG_FILE";
/// Configuration file used when [`CONFIG_FILE_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "rpc-probe.toml";

const ENV_PREFIX: &str = "RPC_PROBE_";

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, message: impl fmt::Display) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Which network and endpoint to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name or numeric chain id.
    #[serde(default = "default_network")]
    pub name: String,

    /// RPC endpoint; the network's public endpoint when unset.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Token contract; the network's USDC when unset.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network(),
            rpc_url: None,
            token: None,
        }
    }
}

/// Identity the probe acts as.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// BIP-39 seed phrase. Never serialized or logged.
    #[serde(default, skip_serializing)]
    pub mnemonic: Option<String>,

    /// Derivation index.
    #[serde(default)]
    pub index: u32,

    /// Read-only address, used when no mnemonic is set.
    #[serde(default)]
    pub address: Option<String>,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("index", &self.index)
            .field("address", &self.address)
            .finish()
    }
}

/// The probe transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Amount in token units.
    #[serde(default = "default_amount")]
    pub amount: Decimal,

    /// Recipient; the sender when unset.
    #[serde(default)]
    pub recipient: Option<String>,

    /// Sign and submit after the access-list step.
    #[serde(default)]
    pub send: bool,

    /// Gas limit sent with `eth_createAccessList`.
    #[serde(default)]
    pub access_list_gas_limit: Option<u64>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            recipient: None,
            send: false,
            access_list_gas_limit: None,
        }
    }
}

/// RPC client tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Receipt poll interval in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Receipt deadline in milliseconds.
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_ms: u64,

    /// Percentage added to gas estimates.
    #[serde(default = "default_gas_buffer")]
    pub gas_buffer_percent: u64,

    /// Prepayment at or above which an access-list "insufficient funds"
    /// answer is treated as provider misestimation, in wei. Written as a
    /// decimal string in TOML so values past `i64` fit.
    #[serde(default = "default_implausible_gas_cost", with = "decimal_wei")]
    pub implausible_gas_cost_wei: U256,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            poll_interval_ms: default_poll_interval(),
            receipt_timeout_ms: default_receipt_timeout(),
            gas_buffer_percent: default_gas_buffer(),
            implausible_gas_cost_wei: default_implausible_gas_cost(),
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    Json,
    /// Pretty format (human-readable).
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::invalid(
                "log.format",
                format!("'{other}', must be json or pretty"),
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network selection.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Account selection.
    #[serde(default)]
    pub account: AccountConfig,

    /// Probe transfer.
    #[serde(default)]
    pub transfer: TransferConfig,

    /// RPC tuning.
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment and optional config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// environment variable holds an unparsable value.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`Self::load`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(CONFIG_FILE_ENV).unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `RPC_PROBE_*` (and `MNEMONIC`) overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for values that do not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        // Network
        if let Some(name) = var("NETWORK") {
            self.network.name = name;
        }
        if let Some(url) = var("RPC_URL") {
            self.network.rpc_url = Some(url);
        }
        if let Some(token) = var("TOKEN") {
            self.network.token = Some(token);
        }

        // Account
        if let Some(mnemonic) = var("MNEMONIC").or_else(|| lookup("MNEMONIC").filter(|v| !v.is_empty())) {
            self.account.mnemonic = Some(mnemonic);
        }
        if let Some(index) = var("ACCOUNT_INDEX") {
            self.account.index = parse_var("account.index", &index)?;
        }
        if let Some(address) = var("ADDRESS") {
            self.account.address = Some(address);
        }

        // Transfer
        if let Some(amount) = var("AMOUNT") {
            self.transfer.amount = parse_var("transfer.amount", &amount)?;
        }
        if let Some(recipient) = var("RECIPIENT") {
            self.transfer.recipient = Some(recipient);
        }
        if let Some(send) = var("SEND") {
            self.transfer.send = parse_bool("transfer.send", &send)?;
        }
        if let Some(gas) = var("ACCESS_LIST_GAS_LIMIT") {
            self.transfer.access_list_gas_limit = Some(parse_var("transfer.access_list_gas_limit", &gas)?);
        }

        // RPC
        if let Some(ms) = var("REQUEST_TIMEOUT_MS") {
            self.rpc.request_timeout_ms = parse_var("rpc.request_timeout_ms", &ms)?;
        }
        if let Some(ms) = var("POLL_INTERVAL_MS") {
            self.rpc.poll_interval_ms = parse_var("rpc.poll_interval_ms", &ms)?;
        }
        if let Some(ms) = var("RECEIPT_TIMEOUT_MS") {
            self.rpc.receipt_timeout_ms = parse_var("rpc.receipt_timeout_ms", &ms)?;
        }
        if let Some(percent) = var("GAS_BUFFER_PERCENT") {
            self.rpc.gas_buffer_percent = parse_var("rpc.gas_buffer_percent", &percent)?;
        }
        if let Some(wei) = var("IMPLAUSIBLE_GAS_COST_WEI") {
            self.rpc.implausible_gas_cost_wei = U256::from_dec_str(wei.trim()).map_err(|e| {
                ConfigError::invalid("rpc.implausible_gas_cost_wei", format!("'{wei}': {e}"))
            })?;
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = format.parse()?;
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network()?;
        self.rpc_url()?;
        self.token_address()?;
        self.recipient()?;

        if self.transfer.amount.is_sign_negative() && !self.transfer.amount.is_zero() {
            return Err(ConfigError::invalid(
                "transfer.amount",
                format!("{} is negative", self.transfer.amount),
            ));
        }
        if self.rpc.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("rpc.poll_interval_ms", "must be positive"));
        }
        if self.rpc.request_timeout_ms == 0 {
            return Err(ConfigError::invalid("rpc.request_timeout_ms", "must be positive"));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            ));
        }

        if self.transfer.send && self.account.mnemonic.is_none() {
            return Err(ConfigError::invalid(
                "transfer.send",
                "send mode requires a mnemonic",
            ));
        }
        if self.account.mnemonic.is_none() && self.account.address.is_none() {
            return Err(ConfigError::invalid(
                "account",
                "set a mnemonic or a read-only address",
            ));
        }
        self.account()?;
        Ok(())
    }

    /// Resolves the network selector.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unknown networks.
    pub fn network(&self) -> Result<Network, ConfigError> {
        self.network
            .name
            .parse()
            .map_err(|e| ConfigError::invalid("network.name", e))
    }

    /// Returns the RPC endpoint: the override, or the network's public one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown network or bad URL.
    pub fn rpc_url(&self) -> Result<String, ConfigError> {
        let url = match &self.network.rpc_url {
            Some(url) => url.clone(),
            None => self.network()?.default_rpc_url().to_string(),
        };
        parse_endpoint(&url).map_err(|e| ConfigError::invalid("network.rpc_url", e))?;
        Ok(url)
    }

    /// Returns the token contract: the override, or the network's USDC.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown network or bad address.
    pub fn token_address(&self) -> Result<Address, ConfigError> {
        match &self.network.token {
            Some(token) => parse_address(token),
            None => parse_address(self.network()?.usdc_address()),
        }
        .map_err(|e| ConfigError::invalid("network.token", e))
    }

    /// Returns the configured recipient, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a bad address.
    pub fn recipient(&self) -> Result<Option<Address>, ConfigError> {
        self.transfer
            .recipient
            .as_deref()
            .map(parse_address)
            .transpose()
            .map_err(|e| ConfigError::invalid("transfer.recipient", e))
    }

    /// Builds the account: derived from the mnemonic when set, otherwise the
    /// read-only address, otherwise none.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a bad mnemonic or address.
    pub fn account(&self) -> Result<Option<Account>, ConfigError> {
        if let Some(phrase) = &self.account.mnemonic {
            let chain_id = self.network()?.chain_id();
            return Account::from_mnemonic(phrase, self.account.index, chain_id)
                .map(Some)
                .map_err(|e| match e {
                    AccountError::InvalidMnemonic(_) => {
                        ConfigError::invalid("account.mnemonic", "not a valid BIP-39 phrase")
                    }
                    other => ConfigError::invalid("account.mnemonic", other),
                });
        }
        self.account
            .address
            .as_deref()
            .map(|address| parse_address(address).map(Account::read_only))
            .transpose()
            .map_err(|e| ConfigError::invalid("account.address", e))
    }

    /// Returns the access-list misestimation policy.
    #[must_use]
    pub fn misestimation_policy(&self) -> GasMisestimationPolicy {
        GasMisestimationPolicy::new(self.rpc.implausible_gas_cost_wei)
    }
}

fn parse_var<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(field, format!("'{value}': {e}")))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, format!("'{value}' is not a boolean"))),
    }
}

/// Wei amounts as decimal strings. Plain integers are accepted on input.
mod decimal_wei {
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Integer(u64),
        Text(String),
    }

    pub(super) fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Integer(value) => Ok(U256::from(value)),
            Repr::Text(text) => U256::from_dec_str(text.trim())
                .map_err(|e| serde::de::Error::custom(format!("invalid wei amount '{text}': {e}"))),
        }
    }
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_network() -> String {
    "base".to_string()
}

fn default_amount() -> Decimal {
    Decimal::new(1, 2)
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_poll_interval() -> u64 {
    2_000
}

fn default_receipt_timeout() -> u64 {
    120_000
}

fn default_gas_buffer() -> u64 {
    20
}

fn default_implausible_gas_cost() -> U256 {
    U256::exp10(18)
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MNEMONIC: &str = "test test test test test test test test test test test junk";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn read_only() -> AppConfig {
        let mut config = AppConfig::default();
        config.account.address = Some("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".into());
        config
    }

    #[test]
    fn app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.network.name, "base");
        assert_eq!(config.transfer.amount, Decimal::new(1, 2));
        assert!(!config.transfer.send);
        assert_eq!(config.rpc.poll_interval_ms, 2_000);
        assert_eq!(config.rpc.receipt_timeout_ms, 120_000);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn defaults_resolve_to_base() {
        let config = read_only();
        assert_eq!(config.network().unwrap(), Network::Base);
        assert_eq!(config.rpc_url().unwrap(), Network::Base.default_rpc_url());
        assert_eq!(
            config.token_address().unwrap(),
            parse_address(Network::Base.usdc_address()).unwrap()
        );
        assert!(config.validate().is_ok());
        assert!(!config.account().unwrap().unwrap().can_sign());
    }

    #[test]
    fn parses_toml_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [network]
            name = "celo"
            rpc_url = "https://forno.celo.org"

            [account]
            mnemonic = "test test test test test test test test test test test junk"
            index = 1

            [transfer]
            amount = "0.5"
            send = true
            access_list_gas_limit = 100000

            [log]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.network().unwrap(), Network::Celo);
        assert_eq!(config.transfer.amount, Decimal::new(5, 1));
        assert_eq!(config.transfer.access_list_gas_limit, Some(100_000));
        assert_eq!(config.rpc.gas_buffer_percent, 20);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.account().unwrap().unwrap().address(),
            parse_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
        );
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("RPC_PROBE_NETWORK", "42161"),
                ("MNEMONIC", MNEMONIC),
                ("RPC_PROBE_SEND", "true"),
                ("RPC_PROBE_AMOUNT", "1.25"),
                ("RPC_PROBE_ACCESS_LIST_GAS_LIMIT", "80000"),
                ("RPC_PROBE_POLL_INTERVAL_MS", "500"),
                ("RPC_PROBE_LOG_FORMAT", "json"),
            ]))
            .unwrap();
        assert_eq!(config.network().unwrap(), Network::Arbitrum);
        assert_eq!(config.account.mnemonic.as_deref(), Some(MNEMONIC));
        assert!(config.transfer.send);
        assert_eq!(config.transfer.amount, Decimal::new(125, 2));
        assert_eq!(config.transfer.access_list_gas_limit, Some(80_000));
        assert_eq!(config.rpc.poll_interval_ms, 500);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn prefixed_mnemonic_wins_over_plain() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("MNEMONIC", "plain"), ("RPC_PROBE_MNEMONIC", MNEMONIC)]))
            .unwrap();
        assert_eq!(config.account.mnemonic.as_deref(), Some(MNEMONIC));
    }

    #[test]
    fn unparsable_env_values_are_rejected() {
        for (key, value) in [
            ("RPC_PROBE_AMOUNT", "lots"),
            ("RPC_PROBE_SEND", "maybe"),
            ("RPC_PROBE_POLL_INTERVAL_MS", "-1"),
            ("RPC_PROBE_LOG_FORMAT", "xml"),
        ] {
            let mut config = AppConfig::default();
            assert!(
                config.apply_env_overrides(env(&[(key, value)])).is_err(),
                "{key}={value}"
            );
        }
    }

    #[test]
    fn load_with_missing_file_uses_defaults() {
        let config = AppConfig::load_with(env(&[
            (CONFIG_FILE_ENV, "/nonexistent/rpc-probe.toml"),
            ("RPC_PROBE_NETWORK", "optimism"),
        ]))
        .unwrap();
        assert_eq!(config.network().unwrap(), Network::Optimism);
    }

    #[test]
    fn load_with_reads_file_then_env() {
        let path = std::env::temp_dir().join(format!("rpc-probe-{}.toml", std::process::id()));
        std::fs::write(&path, "[network]\nname = \"polygon\"\n[rpc]\ngas_buffer_percent = 50\n").unwrap();
        let config = AppConfig::load_with(env(&[
            (CONFIG_FILE_ENV, path.to_str().unwrap()),
            ("RPC_PROBE_GAS_BUFFER_PERCENT", "10"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.network().unwrap(), Network::Polygon);
        assert_eq!(config.rpc.gas_buffer_percent, 10);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = read_only();
        config.network.name = "solana".into();
        assert!(config.validate().is_err());

        let mut config = read_only();
        config.network.rpc_url = Some("not a url".into());
        assert!(config.validate().is_err());

        let mut config = read_only();
        config.transfer.recipient = Some("0x1234".into());
        assert!(config.validate().is_err());

        let mut config = read_only();
        config.transfer.amount = Decimal::new(-1, 0);
        assert!(config.validate().is_err());

        let mut config = read_only();
        config.rpc.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = read_only();
        config.log.level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = read_only();
        config.transfer.send = true;
        assert!(config.validate().is_err());

        assert!(AppConfig::default().validate().is_err());
    }

    #[test]
    fn bad_mnemonic_is_rejected_without_echo() {
        let mut config = AppConfig::default();
        config.account.mnemonic = Some("correct horse battery staple".into());
        let err = config.account().unwrap_err();
        assert!(!err.to_string().contains("horse"));
    }

    #[test]
    fn mnemonic_is_redacted() {
        let mut config = AppConfig::default();
        config.account.mnemonic = Some(MNEMONIC.into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("junk"));
        assert!(debug.contains("<redacted>"));
        assert!(!toml::to_string(&config).unwrap().contains("junk"));
    }

    #[test]
    fn misestimation_policy_from_config() {
        let mut config = AppConfig::default();
        assert_eq!(config.misestimation_policy(), GasMisestimationPolicy::default());
        config.rpc.implausible_gas_cost_wei = U256::from(500u64);
        assert_eq!(
            config.misestimation_policy(),
            GasMisestimationPolicy::new(U256::from(500u64))
        );
    }

    #[test]
    fn implausible_gas_cost_holds_values_past_u64() {
        let thirty_eth = U256::from(30u64) * U256::exp10(18);

        let config: AppConfig =
            toml::from_str("[rpc]\nimplausible_gas_cost_wei = \"30000000000000000000\"\n").unwrap();
        assert_eq!(config.rpc.implausible_gas_cost_wei, thirty_eth);
        assert!(toml::to_string(&config).unwrap().contains("\"30000000000000000000\""));

        let config: AppConfig = toml::from_str("[rpc]\nimplausible_gas_cost_wei = 5000\n").unwrap();
        assert_eq!(config.rpc.implausible_gas_cost_wei, U256::from(5_000u64));

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("RPC_PROBE_IMPLAUSIBLE_GAS_COST_WEI", "30000000000000000000")]))
            .unwrap();
        assert_eq!(config.misestimation_policy(), GasMisestimationPolicy::new(thirty_eth));

        assert!(
            AppConfig::default()
                .apply_env_overrides(env(&[("RPC_PROBE_IMPLAUSIBLE_GAS_COST_WEI", "0x10")]))
                .is_err()
        );
        assert!(toml::from_str::<AppConfig>("[rpc]\nimplausible_gas_cost_wei = \"lots\"\n").is_err());
    }
}
