use crate::options::sub_command::Commands;
use clap::Parser;

/// program to find prompt inputs in pages and optimize prompts.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Build main sub commands
    #[clap(subcommand)]
    pub command: Option<Commands>,
    /// Print log output on standard error
    #[clap(short, long, global = true)]
    pub verbose: bool,
    /// Session config JSON file (quiet periods, overlay metrics, marker attribute).
    #[clap(short, long, global = true)]
    pub config: Option<String>,
}
