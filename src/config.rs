//! Scheduler configuration.
//!
//! These values drive queue pumping cadence and worker-thread layout. In
//! most cases you should use [`SchedulerBuilder`](crate::SchedulerBuilder)
//! rather than filling a [`SchedulerConfig`] by hand.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `networking_threads` | 1 |
//! | `poll_interval` | 100 ms |
//! | `idle_delay` | 100 ms |
//! | `startup_delay` | 10 ms |
//! | `thread_name_prefix` | `"offstage"` |
//! | `thread_stack_size` | platform default |
//!
//! # Configuration precedence
//!
//! Sources are applied in the order the builder methods are called, so
//! apply the lowest-priority source first:
//!
//! 1. **Defaults** — [`SchedulerConfig::default()`]
//! 2. **Config file** — [`SchedulerBuilder::load_toml_file`](crate::SchedulerBuilder::load_toml_file) (requires the `config-file` feature)
//! 3. **Environment variables** — [`SchedulerBuilder::load_env`](crate::SchedulerBuilder::load_env)
//! 4. **Programmatic** — individual builder setters
//!
//! # Supported environment variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `OFFSTAGE_NETWORKING_THREADS` | `usize` | `networking_threads` |
//! | `OFFSTAGE_POLL_INTERVAL_MS` | `u64` | `poll_interval` |
//! | `OFFSTAGE_IDLE_DELAY_MS` | `u64` | `idle_delay` |
//! | `OFFSTAGE_STARTUP_DELAY_MS` | `u64` | `startup_delay` |
//! | `OFFSTAGE_THREAD_NAME_PREFIX` | `String` | `thread_name_prefix` |
//! | `OFFSTAGE_THREAD_STACK_SIZE` | `usize` | `thread_stack_size` |

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SchedulerError;

/// Environment variable name for the networking worker count.
pub const ENV_NETWORKING_THREADS: &str = "OFFSTAGE_NETWORKING_THREADS";
/// Environment variable name for the worker poll interval (milliseconds).
pub const ENV_POLL_INTERVAL_MS: &str = "OFFSTAGE_POLL_INTERVAL_MS";
/// Environment variable name for the idle pump reschedule delay (milliseconds).
pub const ENV_IDLE_DELAY_MS: &str = "OFFSTAGE_IDLE_DELAY_MS";
/// Environment variable name for the startup pump kick delay (milliseconds).
pub const ENV_STARTUP_DELAY_MS: &str = "OFFSTAGE_STARTUP_DELAY_MS";
/// Environment variable name for the worker thread name prefix.
pub const ENV_THREAD_NAME_PREFIX: &str = "OFFSTAGE_THREAD_NAME_PREFIX";
/// Environment variable name for the worker thread stack size (bytes).
pub const ENV_THREAD_STACK_SIZE: &str = "OFFSTAGE_THREAD_STACK_SIZE";

/// Scheduler configuration.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Number of networking worker threads.
    ///
    /// Defaults to 1. Raise it only when networking task bodies are safe
    /// to run concurrently; typical network client libraries are not.
    pub networking_threads: usize,
    /// Upper bound on a worker's parked wait for new work. The active
    /// flag is re-checked at least this often, which bounds shutdown
    /// latency for an idle worker.
    pub poll_interval: Duration,
    /// Reschedule delay a pump requests when its queue is empty.
    pub idle_delay: Duration,
    /// Delay carried by the pump kick events emitted by
    /// [`Scheduler::start`](crate::Scheduler::start).
    pub startup_delay: Duration,
    /// Name prefix for worker threads.
    pub thread_name_prefix: String,
    /// Stack size per worker thread in bytes; `None` uses the platform
    /// default.
    pub thread_stack_size: Option<usize>,
    /// Callback executed on each worker thread before its loop. This is
    /// the hook for best-effort thread priority or affinity setup.
    pub on_thread_start: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Callback executed on each worker thread after its loop.
    pub on_thread_stop: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            networking_threads: 1,
            poll_interval: Duration::from_millis(100),
            idle_delay: Duration::from_millis(100),
            startup_delay: Duration::from_millis(10),
            thread_name_prefix: "offstage".to_string(),
            thread_stack_size: None,
            on_thread_start: None,
            on_thread_stop: None,
        }
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("networking_threads", &self.networking_threads)
            .field("poll_interval", &self.poll_interval)
            .field("idle_delay", &self.idle_delay)
            .field("startup_delay", &self.startup_delay)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .field("thread_stack_size", &self.thread_stack_size)
            .field("on_thread_start", &self.on_thread_start.is_some())
            .field("on_thread_stop", &self.on_thread_stop.is_some())
            .finish()
    }
}

impl SchedulerConfig {
    /// Normalizes values to safe ones: at least one networking worker,
    /// and a nonzero poll interval so idle workers do not spin.
    pub fn normalize(&mut self) {
        if self.networking_threads == 0 {
            self.networking_threads = 1;
        }
        if self.poll_interval < Duration::from_millis(1) {
            self.poll_interval = Duration::from_millis(1);
        }
    }
}

/// Applies `OFFSTAGE_*` environment overrides to `config`.
///
/// Only variables that are set (and non-empty) are applied. Returns an
/// error if a variable is set but holds an unparseable value.
pub fn apply_env_overrides(config: &mut SchedulerConfig) -> Result<(), SchedulerError> {
    if let Some(val) = read_env(ENV_NETWORKING_THREADS) {
        config.networking_threads = parse_usize(ENV_NETWORKING_THREADS, &val)?;
    }
    if let Some(val) = read_env(ENV_POLL_INTERVAL_MS) {
        config.poll_interval = parse_millis(ENV_POLL_INTERVAL_MS, &val)?;
    }
    if let Some(val) = read_env(ENV_IDLE_DELAY_MS) {
        config.idle_delay = parse_millis(ENV_IDLE_DELAY_MS, &val)?;
    }
    if let Some(val) = read_env(ENV_STARTUP_DELAY_MS) {
        config.startup_delay = parse_millis(ENV_STARTUP_DELAY_MS, &val)?;
    }
    if let Some(val) = read_env(ENV_THREAD_NAME_PREFIX) {
        config.thread_name_prefix = val;
    }
    if let Some(val) = read_env(ENV_THREAD_STACK_SIZE) {
        config.thread_stack_size = Some(parse_usize(ENV_THREAD_STACK_SIZE, &val)?);
    }
    Ok(())
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|val| !val.trim().is_empty())
}

fn parse_usize(key: &str, val: &str) -> Result<usize, SchedulerError> {
    val.trim().parse().map_err(|_| {
        SchedulerError::invalid_config(key, format!("expected unsigned integer, got {val:?}"))
    })
}

fn parse_millis(key: &str, val: &str) -> Result<Duration, SchedulerError> {
    let millis: u64 = val.trim().parse().map_err(|_| {
        SchedulerError::invalid_config(key, format!("expected milliseconds, got {val:?}"))
    })?;
    Ok(Duration::from_millis(millis))
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable scheduler configuration.
///
/// Mirrors the plain-data fields of [`SchedulerConfig`] in a
/// serialization-friendly layout, grouped into TOML tables:
///
/// ```toml
/// [workers]
/// networking_threads = 2
/// poll_interval_ms = 100
/// thread_name_prefix = "myapp"
/// thread_stack_size = 2097152
///
/// [pumps]
/// idle_delay_ms = 100
/// startup_delay_ms = 10
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct SchedulerTomlConfig {
    /// Worker thread settings.
    #[serde(default)]
    pub workers: WorkersToml,
    /// Pump cadence settings.
    #[serde(default)]
    pub pumps: PumpsToml,
}

/// Worker section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct WorkersToml {
    /// Number of networking worker threads.
    pub networking_threads: Option<usize>,
    /// Worker poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Name prefix for worker threads.
    pub thread_name_prefix: Option<String>,
    /// Stack size per worker thread in bytes.
    pub thread_stack_size: Option<usize>,
}

/// Pump section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct PumpsToml {
    /// Idle pump reschedule delay in milliseconds.
    pub idle_delay_ms: Option<u64>,
    /// Startup pump kick delay in milliseconds.
    pub startup_delay_ms: Option<u64>,
}

/// Applies a parsed TOML config to a [`SchedulerConfig`].
///
/// Only fields that are `Some` override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut SchedulerConfig, toml: &SchedulerTomlConfig) {
    if let Some(v) = toml.workers.networking_threads {
        config.networking_threads = v;
    }
    if let Some(v) = toml.workers.poll_interval_ms {
        config.poll_interval = Duration::from_millis(v);
    }
    if let Some(ref v) = toml.workers.thread_name_prefix {
        config.thread_name_prefix.clone_from(v);
    }
    if let Some(v) = toml.workers.thread_stack_size {
        config.thread_stack_size = Some(v);
    }
    if let Some(v) = toml.pumps.idle_delay_ms {
        config.idle_delay = Duration::from_millis(v);
    }
    if let Some(v) = toml.pumps.startup_delay_ms {
        config.startup_delay = Duration::from_millis(v);
    }
}

/// Parses a TOML string into a [`SchedulerTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<SchedulerTomlConfig, SchedulerError> {
    toml::from_str(toml_str)
        .map_err(|e| SchedulerError::invalid_config("config file", e.to_string()))
}

/// Reads and parses a TOML file into a [`SchedulerTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<SchedulerTomlConfig, SchedulerError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SchedulerError::invalid_config(path.display().to_string(), format!("unreadable: {e}"))
    })?;
    parse_toml_str(&content)
}

// =========================================================================
// Tests
// =========================================================================
