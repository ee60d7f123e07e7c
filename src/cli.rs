use clap::Parser;
use sharepick::config::DEFAULT_PROGRESS_EVERY;
use sharepick::EngineConfig;
use std::path::PathBuf;

/// sharepick – pick stream paths and turn them into `share` directives
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File with one stream path per line ("-" reads stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "scan", required_unless_present = "scan")]
    pub paths: Option<PathBuf>,

    /// Build the path list from a local directory instead of a list file
    #[arg(long, value_name = "DIR")]
    pub scan: Option<PathBuf>,

    /// Include files ignored by .gitignore/.ignore when scanning
    #[arg(long, requires = "scan")]
    pub include_ignored: bool,

    /// Depot/stream prefix to strip from every listed path (e.g. //Game/main)
    #[arg(long, value_name = "PREFIX")]
    pub strip_prefix: Option<String>,

    /// Existing `share` lines to start the selection from
    #[arg(long, value_name = "FILE")]
    pub existing: Option<PathBuf>,

    /// Run without the TUI: apply --select paths and print the directives.
    #[arg(long)]
    pub headless: bool,

    /// Path (file or folder, "." for everything) to check in headless mode.
    /// Can be specified multiple times.
    #[arg(long = "select", value_name = "PATH", requires = "headless")]
    pub select: Vec<String>,

    /// Copy the directives to the clipboard instead of printing them
    #[arg(long)]
    pub copy: bool,

    /// File name that always starts checked (replaces the default ignore-list markers).
    /// Can be specified multiple times.
    #[arg(long = "sentinel", value_name = "NAME")]
    pub sentinels: Vec<String>,

    /// Paths processed between progress updates while building the tree
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file (the TUI otherwise keeps logging off)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            progress_every: self.progress_every.max(1),
            ..EngineConfig::default()
        };
        if !self.sentinels.is_empty() {
            config.sentinel_names = self.sentinels.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sentinels_replace_the_defaults() {
        let cli = Cli::parse_from(["sharepick", "--paths", "list.txt", "--sentinel", "KEEP"]);
        assert_eq!(cli.engine_config().sentinel_names, vec!["KEEP".to_string()]);

        let cli = Cli::parse_from(["sharepick", "--paths", "list.txt", "--progress-every", "0"]);
        assert_eq!(cli.engine_config(), EngineConfig { progress_every: 1, ..EngineConfig::default() });
    }

    #[test]
    fn select_requires_headless() {
        assert!(Cli::try_parse_from(["sharepick", "--paths", "l", "--select", "a"]).is_err());
        assert!(Cli::try_parse_from(["sharepick", "--headless", "--select", "a"]).is_err());
    }
}
