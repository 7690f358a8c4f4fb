//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::game::SimulationConfig;
use crate::net::protocol::CONTROL_PORT;
use crate::util::time::{CAPTURE_INTERVAL_MS, TARGET_TPS};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,

    /// Address the input server binds (all interfaces by default)
    pub input_addr: SocketAddr,
    /// Where the capture process sends its control datagrams
    pub control_target: SocketAddr,

    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Headless play area width
    pub screen_width: u32,
    /// Headless play area height
    pub screen_height: u32,
    /// Device steering the player
    pub left_device: String,
    /// Device aiming the gun
    pub right_device: String,
    /// Optional JSON-lines snapshot output
    pub snapshot_path: Option<PathBuf>,
    /// Simulation tunables
    pub simulation: SimulationConfig,

    /// Device name the capture process reports as
    pub capture_device: String,
    /// Directory of PGM frames fed to the tracker
    pub frame_dir: PathBuf,
    /// Delay between captured frames in milliseconds
    pub capture_interval_ms: u64,
    /// Mirror frames horizontally before tracking
    pub capture_mirror: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source; unset keys take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let mut simulation = SimulationConfig::default();
        if let Some(seed) = vars.get("SIM_SEED") {
            simulation.seed = Some(parse_value("SIM_SEED", &seed)?);
        }

        let tick_rate: u32 = vars.parse_or("TICK_RATE", TARGET_TPS)?;
        if tick_rate == 0 {
            return Err(ConfigError::Invalid("TICK_RATE", "0".to_string()));
        }
        simulation.tick_rate = tick_rate;

        let screen_width: u32 = vars.parse_or("SCREEN_WIDTH", 80)?;
        let screen_height: u32 = vars.parse_or("SCREEN_HEIGHT", 24)?;
        if screen_width < 4 || screen_height < 3 {
            return Err(ConfigError::ScreenTooSmall {
                width: screen_width,
                height: screen_height,
            });
        }

        Ok(Self {
            log_level: vars.get_or("LOG_LEVEL", "info"),
            log_json: vars.get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),

            input_addr: vars.parse_or("INPUT_ADDR", SocketAddr::from(([0, 0, 0, 0], CONTROL_PORT)))?,
            control_target: vars.parse_or(
                "CONTROL_TARGET",
                SocketAddr::from(([127, 0, 0, 1], CONTROL_PORT)),
            )?,

            tick_rate,
            screen_width,
            screen_height,
            left_device: vars.get_or("LEFT_DEVICE", "joystick1"),
            right_device: vars.get_or("RIGHT_DEVICE", "joystick2"),
            snapshot_path: vars.get("SNAPSHOT_PATH").map(PathBuf::from),
            simulation,

            capture_device: vars.get_or("CAPTURE_DEVICE", "joystick1"),
            frame_dir: PathBuf::from(vars.get_or("FRAME_DIR", "frames")),
            capture_interval_ms: vars.parse_or("CAPTURE_INTERVAL_MS", CAPTURE_INTERVAL_MS)?,
            capture_mirror: vars.parse_or("CAPTURE_MIRROR", true)?,
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Read and parse `key`, falling back to `default` when it is unset
    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(key, raw.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Screen size {width}x{height} leaves no play area")]
    ScreenTooSmall { width: u32, height: u32 },
}
