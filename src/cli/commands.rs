use clap::{Parser, Subcommand};

use crate::ai::models::LengthTier;

#[derive(Parser)]
#[command(name = "inkrelay", version, about = "Inkrelay realtime and AI writing server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API and WebSocket server
    Serve,

    /// Analyze an article idea and print the matched keywords
    Analyze {
        /// The article idea to analyze
        #[arg(short, long)]
        prompt: String,
    },

    /// Generate an article draft from the terminal
    Generate {
        /// The article idea to write from
        #[arg(short, long)]
        prompt: String,

        /// Length tier: short, mid-length, or long
        #[arg(short, long)]
        length: Option<LengthTier>,

        /// Tone of voice, e.g. professional or casual
        #[arg(short, long)]
        tone: Option<String>,

        /// Subtopic keywords to cover
        #[arg(short, long)]
        keywords: Vec<String>,
    },
}
