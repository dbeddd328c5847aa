use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Serve a remote photo folder from an in-memory content cache.
#[derive(Debug, Parser)]
#[command(name = "gallery", version)]
pub struct Cli {
    /// Configuration file (defaults to gallery.toml in the platform config directory)
    #[arg(long, short, global = true, env = "GALLERY_CONFIG")]
    pub config: Option<PathBuf>,
    /// Log verbosity; RUST_LOG takes precedence when set
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Synchronize once and print the catalog as JSON
    List,
    /// Write the original bytes of a photo to a file
    Get {
        name: String,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Write a thumbnail of a photo to a file
    Thumb {
        name: String,
        /// Width in pixels (defaults to the configured default size)
        #[arg(long, short = 'W')]
        width: Option<u32>,
        /// Height in pixels (defaults to the width)
        #[arg(long, short = 'H')]
        height: Option<u32>,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Keep the catalog synchronized until interrupted
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
