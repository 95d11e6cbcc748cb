use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::keypad::KeypadState;

pub const TICK_RATE_MIN: u64 = 100;
pub const TICK_RATE_NORMAL: u64 = 250;
pub const TICK_RATE_FAST: u64 = 500;
pub const TICK_RATE_MAX: u64 = 1000;

// Timers always count down at 60Hz
pub const TIMER_RATE: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown tick rate '{0}', expected min, normal, fast, max or a number")]
    TickRate(String),
    #[error("invalid key '{0}', expected a hex digit 0-F")]
    Key(String),
}

#[derive(Debug, Parser)]
#[clap(name = "c8vm", version, about = "Headless CHIP-8 virtual machine")]
struct Cli {
    /// Program image, loaded at 0x200 as-is
    #[clap(parse(from_os_str))]
    rom: PathBuf,

    /// Instructions per second: min, normal, fast, max or a number
    #[clap(long, default_value = "normal")]
    rate: String,

    /// Stop after this many 60Hz frames, run until a fault otherwise
    #[clap(long)]
    frames: Option<u64>,

    /// Comma separated hex keys held down for the whole run, e.g. "5,A"
    #[clap(long, default_value = "")]
    keys: String,

    /// Seed for the random number instruction
    #[clap(long)]
    seed: Option<u64>,

    /// Run frames back to back instead of in real time
    #[clap(long)]
    unthrottled: bool,

    /// Print the screen after every frame that drew something
    #[clap(long)]
    trace_screen: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rom_path: PathBuf,
    pub tick_rate: u64,
    pub timer_rate: u64,
    pub frames: Option<u64>,
    pub held_keys: KeypadState,
    pub seed: Option<u64>,
    pub unthrottled: bool,
    pub trace_screen: bool,
}

impl Config {
    /// Builds the configuration from the process arguments.
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Ok(Self {
            rom_path: cli.rom,
            tick_rate: parse_tick_rate(&cli.rate)?,
            timer_rate: TIMER_RATE,
            frames: cli.frames,
            held_keys: parse_keys(&cli.keys)?,
            seed: cli.seed,
            unthrottled: cli.unthrottled,
            trace_screen: cli.trace_screen,
        })
    }

    pub fn with_rom(rom_path: impl Into<PathBuf>) -> Self {
        Self {
            rom_path: rom_path.into(),
            tick_rate: TICK_RATE_NORMAL,
            timer_rate: TIMER_RATE,
            frames: None,
            held_keys: KeypadState::new(),
            seed: None,
            unthrottled: false,
            trace_screen: false,
        }
    }
}

pub fn parse_tick_rate(value: &str) -> Result<u64, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "min" => Ok(TICK_RATE_MIN),
        "normal" => Ok(TICK_RATE_NORMAL),
        "fast" => Ok(TICK_RATE_FAST),
        "max" => Ok(TICK_RATE_MAX),
        other => match other.parse::<u64>() {
            Ok(rate) if rate > 0 => Ok(rate),
            _ => Err(ConfigError::TickRate(value.to_string())),
        },
    }
}

pub fn parse_keys(value: &str) -> Result<KeypadState, ConfigError> {
    let mut keypad = KeypadState::new();
    for key in value.split(',').map(str::trim).filter(|key| !key.is_empty()) {
        match u8::from_str_radix(key, 16) {
            Ok(idx) if idx <= 0xF => keypad.set(idx, true),
            _ => return Err(ConfigError::Key(key.to_string())),
        }
    }
    Ok(keypad)
}
