use crate::client::{Command, PlayRequest};
use crate::config::{Config, LogLevel, DEFAULT_ADDRESS};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cybersonicd", version, about = "Plays preloaded sound effects over HTTP")]
pub struct DaemonArgs {
    /// Address to listen on [default: 127.0.0.1:49161]
    #[arg(long)]
    pub address: Option<String>,

    /// Logging level (debug, info, warn, error)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Directory containing sfx/ and icons/
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl DaemonArgs {
    /// Overrides file settings with flags. Returns warnings to show the user,
    /// since logging is not set up yet at this point.
    pub fn apply(&self, config: &mut Config) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(level) = &self.log_level {
            match level.parse::<LogLevel>() {
                Ok(level) => config.log_level = level,
                Err(_) => {
                    warnings.push(format!("Invalid log level: {}. Using default (info)", level));
                    config.log_level = LogLevel::Info;
                }
            }
        }
        if let Some(assets) = &self.assets {
            config.assets_dir = Some(assets.clone());
        }
        warnings
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "cybersonic",
    version,
    about = "Lists or plays sounds on a running cybersonicd",
    allow_negative_numbers = true
)]
pub struct ClientArgs {
    /// Sound to play; lists all sounds when omitted
    #[arg(long)]
    pub sfx: Option<String>,

    /// Requester name to send
    #[arg(long)]
    pub name: Option<String>,

    /// Numeric id to send
    #[arg(long)]
    pub id: Option<i64>,

    /// Message to send
    #[arg(long)]
    pub message: Option<String>,

    /// Server address
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Print the request and response before the body
    #[arg(long)]
    pub verbose: bool,

    #[arg(value_name = "SFX")]
    pub sfx_arg: Option<String>,

    #[arg(value_name = "NAME")]
    pub name_arg: Option<String>,

    #[arg(value_name = "ID")]
    pub id_arg: Option<i64>,

    #[arg(value_name = "MESSAGE")]
    pub message_arg: Option<String>,
}

impl ClientArgs {
    /// Positional arguments take precedence over their flags.
    pub fn command(&self) -> Command {
        let sfx = self
            .sfx_arg
            .clone()
            .or_else(|| self.sfx.clone())
            .unwrap_or_default();
        if sfx.is_empty() {
            return Command::List;
        }
        Command::Play(PlayRequest {
            sfx,
            name: self
                .name_arg
                .clone()
                .or_else(|| self.name.clone())
                .unwrap_or_default(),
            id: self.id_arg.or(self.id).unwrap_or(0),
            message: self
                .message_arg
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_default(),
        })
    }
}
