//! CLI-specific configuration structures for TOML-based configuration.

use color_eyre::eyre::{Context, Result};
use milcodec_core::config::{ReceiverConfig, WaveformKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

/// Deep merge JSON values - override takes precedence over base.
/// For objects, recursively merge; for arrays and primitives, override replaces base.
fn merge_json_values(base: &mut JsonValue, override_val: JsonValue) {
    match (base, override_val) {
        (JsonValue::Object(base_map), JsonValue::Object(override_map)) => {
            for (key, value) in override_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_json_values(base_value, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_val, override_val) => {
            *base_val = override_val;
        }
    }
}

/// Custom deserializer to handle both single string and array of strings for include.
fn deserialize_include_optional<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
    }

    let opt: Option<StringOrVec> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(Vec::new()),
        Some(StringOrVec::String(s)) => Ok(vec![s]),
        Some(StringOrVec::Vec(v)) => Ok(v),
    }
}

/// Complete CLI configuration bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Optional path(s) to other config file(s) to include (relative to this config's directory).
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_include_optional")]
    pub include: Vec<String>,

    /// Receiver (physical/link-layer) configuration.
    #[serde(default)]
    pub receiver: ReceiverSettings,

    /// Terminal interface configuration.
    #[serde(default)]
    pub terminal: TerminalConfig,
}

/// Mirrors `milcodec_core::config::ReceiverConfig`, but serializable and with
/// a hex-encoded key so it round-trips through TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverSettings {
    #[serde(default = "default_waveform")]
    pub waveform: WaveformKind,

    #[serde(default)]
    pub auto_scan: bool,

    /// 64 hex characters (32 bytes). Falls back to the reference default key if absent.
    #[serde(default)]
    pub key_hex: Option<String>,

    /// 64 hex characters (32 bytes), Ed25519 verifying key for signed packets.
    #[serde(default)]
    pub verify_key_hex: Option<String>,
}

fn default_waveform() -> WaveformKind {
    WaveformKind::DsssCovert
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            waveform: default_waveform(),
            auto_scan: false,
            key_hex: None,
            verify_key_hex: None,
        }
    }
}

impl ReceiverSettings {
    pub fn to_receiver_config(&self) -> Result<ReceiverConfig> {
        let mut config = ReceiverConfig {
            waveform: self.waveform,
            auto_scan: self.auto_scan,
            ..ReceiverConfig::default()
        };

        if let Some(hex) = &self.key_hex {
            config.key = parse_hex_32(hex).wrap_err("invalid receiver.key_hex")?;
        }
        if let Some(hex) = &self.verify_key_hex {
            config.verify_key = Some(parse_hex_32(hex).wrap_err("invalid receiver.verify_key_hex")?);
        }

        Ok(config)
    }
}

fn parse_hex_32(hex: &str) -> Result<[u8; 32]> {
    let bytes = hex_to_bytes(hex)?;
    bytes
        .try_into()
        .map_err(|_| color_eyre::eyre::eyre!("expected 32 bytes (64 hex characters), got {}", hex.len() / 2))
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        color_eyre::eyre::bail!("hex string must have an even length");
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).wrap_err("invalid hex digit"))
        .collect()
}

/// Terminal interface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Output WAV filename for the `demo` subcommand (optional, overridable via `--output`).
    #[serde(default)]
    pub wav_output: Option<PathBuf>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            wav_output: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_target")]
    pub target: LogTarget,

    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stdout
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            receiver: ReceiverSettings::default(),
            terminal: TerminalConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file, recursively merging `include`d files.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let config_toml: toml::Value =
            toml::from_str(&content).wrap_err("Failed to parse TOML configuration")?;
        let mut config_json =
            serde_json::to_value(&config_toml).wrap_err("Failed to convert TOML to JSON")?;

        let includes = match config_json.get("include") {
            Some(JsonValue::String(s)) => vec![s.clone()],
            Some(JsonValue::Array(arr)) => arr.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
            _ => Vec::new(),
        };

        if let JsonValue::Object(ref mut map) = config_json {
            map.remove("include");
        }

        let mut base_json = serde_json::to_value(Self::default()).wrap_err("Failed to create default config")?;

        for include_path in &includes {
            let include_full_path = if Path::new(include_path).is_absolute() {
                PathBuf::from(include_path)
            } else {
                path.parent().unwrap_or_else(|| Path::new(".")).join(include_path)
            };

            let included_config = Self::from_file(&include_full_path)
                .wrap_err_with(|| format!("Failed to load included config: {}", include_full_path.display()))?;
            let included_json =
                serde_json::to_value(&included_config).wrap_err("Failed to convert included config to JSON")?;
            merge_json_values(&mut base_json, included_json);
        }

        merge_json_values(&mut base_json, config_json);

        let config: CliConfig = serde_json::from_value(base_json).wrap_err("Failed to parse final configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_covert_dsss_and_pretty_logging() {
        let config = CliConfig::default();
        assert_eq!(config.receiver.waveform, WaveformKind::DsssCovert);
        assert_eq!(config.terminal.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parses_a_32_byte_hex_key() {
        let hex = "42".repeat(32);
        let key = parse_hex_32(&hex).unwrap();
        assert_eq!(key, [0x42u8; 32]);
    }

    #[test]
    fn rejects_a_short_hex_key() {
        assert!(parse_hex_32("4242").is_err());
    }

    #[test]
    fn to_receiver_config_falls_back_to_default_key_when_absent() {
        let settings = ReceiverSettings::default();
        let config = settings.to_receiver_config().unwrap();
        assert_eq!(&config.key, milcodec_core::config::DEFAULT_KEY);
    }
}
