use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "api-parity",
    about = "Compare a legacy API against its replacement, case by case",
    version
)]
pub struct Cli {
    /// Run configuration file
    #[arg(env = "PARITY_CONFIG", default_value = "parity.yaml")]
    pub config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Log filter used when RUST_LOG is unset
    pub fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_path() {
        let cli = Cli::try_parse_from(["api-parity", "/etc/parity/staging.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/parity/staging.yaml"));
        assert_eq!(cli.default_log_level(), "info");
    }

    #[test]
    fn test_verbose_flag() {
        let cli = Cli::try_parse_from(["api-parity", "-v", "run.yaml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.default_log_level(), "debug");
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["api-parity", "--concurency", "4"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_config_path() {
        let err = Cli::try_parse_from(["api-parity", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(Cli::try_parse_from(["api-parity", "a.yaml", "b.yaml"]).is_err());
    }
}
