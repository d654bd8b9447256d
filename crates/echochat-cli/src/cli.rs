use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    #[allow(dead_code)]
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "echochat")]
#[command(version, about = "EchoChat - streaming echo chat client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server base URL (defaults to http://127.0.0.1:3000)
    #[arg(long, global = true, env = "ECHOCHAT_SERVER_URL")]
    pub server: Option<String>,

    /// Seconds to wait for each chunk before giving up (0 waits forever)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Send one message and stream the reply
    Send(SendArgs),

    /// Interactive chat session (default)
    Chat,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message text
    pub message: String,
}
