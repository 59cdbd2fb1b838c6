//! Command line arguments.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Capture the server configuration into a snapshot archive
    Export,
    /// Replay a snapshot archive onto the server
    Import,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// What to do with the snapshot
    #[arg(short, long, value_enum)]
    pub action: Action,

    /// Snapshot archive, `-` for stdin/stdout
    #[arg(short, long, value_name = "FILE")]
    pub file: String,

    /// omp connection profile (required for import)
    #[arg(short, long, value_name = "FILE", required_if_eq("action", "import"))]
    pub config: Option<PathBuf>,

    /// Path of the omp client
    #[arg(long, value_name = "PATH", default_value = "omp")]
    pub omp: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_without_profile() {
        let args = Args::try_parse_from(["omp-migrate", "-a", "export", "-f", "-"]).unwrap();
        assert_eq!(args.action, Action::Export);
        assert_eq!(args.file, "-");
        assert_eq!(args.config, None);
        assert_eq!(args.omp, PathBuf::from("omp"));
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_import_requires_profile() {
        let args = ["omp-migrate", "-a", "import", "-f", "snap.tar.zst"];
        assert!(Args::try_parse_from(args).is_err());

        let args = Args::try_parse_from([
            "omp-migrate", "--action", "import", "--file", "snap.tar.zst", "-c", "omp.config",
            "--omp", "/opt/bin/omp", "-l", "debug",
        ])
        .unwrap();
        assert_eq!(args.action, Action::Import);
        assert_eq!(args.config, Some(PathBuf::from("omp.config")));
        assert_eq!(args.omp, PathBuf::from("/opt/bin/omp"));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Args::try_parse_from(["omp-migrate", "-a", "sync", "-f", "x"]).is_err());
    }
}
