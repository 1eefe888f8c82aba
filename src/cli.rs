use clap::Parser;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Find in-scope targets on Bugcrowd and HackerOne", long_about = None)]
pub struct Cli {
    /// Path to the template YAML file
    #[arg(short = 't', long)]
    pub template: PathBuf,

    /// Load .env file from current directory if available
    #[arg(short = 'e', long, default_value_t = false)]
    pub env: bool,

    /// Run without the banner
    #[arg(short = 's', long, default_value_t = false)]
    pub silent: bool,

    /// Enable detailed debug logging
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
