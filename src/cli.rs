use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "lockwho",
    version,
    about = "Find which processes hold a lock or open handle on a file"
)]
pub struct CliArgs {
    /// Limit how many processes the report lists explicitly
    #[arg(short = 'm', long = "max", value_name = "N")]
    pub max: Option<usize>,

    /// Terse output: matching PIDs only
    #[arg(short = 't')]
    pub terse: bool,

    /// Per-record output format (d=default, f=with app name, a=full dump)
    #[arg(short = 'F', value_name = "SPEC")]
    pub format: Option<String>,

    /// Only report processes holding an actual lock, not mere open handles
    #[arg(long = "locks-only")]
    pub locks_only: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Files to query
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}
