use anyhow::{Context, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Concurrency strategy backing a store
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
  /// HashMap behind a reader/writer lock
  Locked,
  /// HashMap owned by a single worker task
  #[default]
  Actor,
  /// Actor worker with pooled reply channels
  Pooled,
}

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Store configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
  #[serde(default)]
  pub strategy: Strategy,

  /// Requests that may wait in the actor queue before senders block
  #[serde(default = "default_queue_capacity")]
  pub queue_capacity: usize,

  /// Upper bound on waiting for a Get/ListKeys reply, unbounded if not set
  pub reply_timeout_ms: Option<u64>,

  /// Idle reply channels retained by the pooled strategy
  #[serde(default = "default_reply_pool_size")]
  pub reply_pool_size: usize,
}

fn default_queue_capacity() -> usize {
  1
}

fn default_reply_pool_size() -> usize {
  32
}

impl StoreConfig {
  pub fn reply_timeout(&self) -> Option<Duration> {
    self.reply_timeout_ms.map(Duration::from_millis)
  }

  pub fn validate(&self) -> anyhow::Result<()> {
    if self.queue_capacity == 0 {
      bail!("store.queue_capacity must be at least 1");
    }
    if self.queue_capacity > Semaphore::MAX_PERMITS {
      bail!(
        "store.queue_capacity must be at most {}",
        Semaphore::MAX_PERMITS
      );
    }
    if self.strategy == Strategy::Pooled && self.reply_pool_size == 0 {
      bail!("store.reply_pool_size must be at least 1 for the pooled strategy");
    }
    Ok(())
  }
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      strategy: Strategy::default(),
      queue_capacity: default_queue_capacity(),
      reply_timeout_ms: None,
      reply_pool_size: default_reply_pool_size(),
    }
  }
}

/// Top level configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  /// Store configuration
  #[serde(default)]
  pub store: StoreConfig,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> anyhow::Result<Self> {
    let config_str = fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file '{}'", path))?;

    let config: Config = toml::from_str(&config_str)
      .with_context(|| format!("Failed to parse config file '{}'", path))?;

    config.store.validate()?;

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.store.strategy, Strategy::Actor);
    assert_eq!(config.store.queue_capacity, 1);
    assert_eq!(config.store.reply_timeout(), None);
    assert_eq!(config.store.reply_pool_size, 32);
    assert_eq!(config.log.level, "info");
    assert!(config.log.file.is_none());
  }

  #[test]
  fn test_full_config() {
    let config_str = r#"
[store]
strategy = "pooled"
queue_capacity = 16
reply_timeout_ms = 250
reply_pool_size = 4

[log]
level = "debug"
file = "/tmp/syncmap.log"
"#;

    let config: Config = toml::from_str(config_str).unwrap();
    assert_eq!(config.store.strategy, Strategy::Pooled);
    assert_eq!(config.store.queue_capacity, 16);
    assert_eq!(config.store.reply_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(config.store.reply_pool_size, 4);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.file.as_deref(), Some("/tmp/syncmap.log"));
    assert!(config.store.validate().is_ok());
  }

  #[test]
  fn test_unknown_strategy_rejected() {
    let result: Result<Config, _> = toml::from_str("[store]\nstrategy = \"sharded\"\n");
    assert!(result.is_err());
  }

  #[test]
  fn test_validate_rejects_zero_capacity() {
    let config = StoreConfig {
      queue_capacity: 0,
      ..StoreConfig::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_validate_rejects_oversized_capacity() {
    let config: Config = toml::from_str("[store]\nqueue_capacity = 9223372036854775807\n").unwrap();
    let err = config.store.validate().unwrap_err();
    assert!(err.to_string().contains("at most"));

    let config = StoreConfig {
      queue_capacity: Semaphore::MAX_PERMITS,
      ..StoreConfig::default()
    };
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_validate_accepts_large_pool() {
    let config = StoreConfig {
      strategy: Strategy::Pooled,
      reply_pool_size: usize::MAX,
      ..StoreConfig::default()
    };
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_validate_rejects_empty_pool() {
    let config = StoreConfig {
      strategy: Strategy::Pooled,
      reply_pool_size: 0,
      ..StoreConfig::default()
    };
    assert!(config.validate().is_err());

    let config = StoreConfig {
      strategy: Strategy::Actor,
      reply_pool_size: 0,
      ..StoreConfig::default()
    };
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_from_file_missing() {
    let err = Config::from_file("/nonexistent/syncmap.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
  }
}
