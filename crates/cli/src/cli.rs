use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scriptrelay")]
#[command(version)]
#[command(about = "Submit scripts to a remote scene worker and keep a durable session log")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Worker WebSocket endpoint (overrides WORKER_WS_URL)
    #[arg(long, global = true)]
    pub worker_url: Option<String>,

    /// Directory for session logs (overrides SESSION_DIR)
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,

    /// Per-job timeout in seconds (overrides SCRIPT_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive menu (default)
    Menu,

    /// Run script files as one composite job. Directories expand to their
    /// *.py files in name order
    Run {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List prior sessions
    Sessions,

    /// Print one session log
    Show { file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["scriptrelay"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn run_requires_paths() {
        assert!(Cli::try_parse_from(["scriptrelay", "run"]).is_err());

        let cli = Cli::try_parse_from(["scriptrelay", "run", "a.py", "scenes/"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Run {
                paths: vec![PathBuf::from("a.py"), PathBuf::from("scenes/")]
            })
        );
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "scriptrelay",
            "sessions",
            "--session-dir",
            "/tmp/logs",
            "--timeout-secs",
            "90",
        ])
        .unwrap();
        assert_eq!(cli.session_dir, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(cli.timeout_secs, Some(90));
        assert_eq!(cli.command, Some(Command::Sessions));
    }
}
