//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for ignite-cli.

use clap::Parser;
use std::path::PathBuf;

/// Ignite CLI - Replay notification and deep-link scenarios against the client core
#[derive(Parser, Debug, Clone)]
#[command(name = "ignite-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Scenario file, one JSON step per line (default: read stdin)
    pub scenario: Option<PathBuf>,

    /// Settings file (default: ~/.ignite/settings.toml)
    #[arg(long, env = "IGNITE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Session file (overrides `session.storage_path` from settings)
    #[arg(long, env = "IGNITE_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Write a settings template if the settings file does not exist
    #[arg(long)]
    pub init_settings: bool,

    /// Output events as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Only print navigation results and opened URIs
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Read the scenario from the file argument or from piped stdin.
    ///
    /// Returns an error when neither is available, rather than blocking on
    /// an interactive terminal.
    pub async fn read_scenario(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        use tokio::io::AsyncReadExt;

        if let Some(ref path) = self.scenario {
            return tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read scenario file: {}", path.display()));
        }

        if atty::is(atty::Stream::Stdin) {
            anyhow::bail!("No scenario given. Pass a scenario file or pipe steps on stdin");
        }

        let mut source = String::new();
        tokio::io::stdin()
            .read_to_string(&mut source)
            .await
            .context("Failed to read scenario from stdin")?;
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["ignite-cli"]);
        assert_eq!(args.scenario, None);
        assert!(!args.init_settings);
        assert!(!args.json);
        assert!(!args.quiet);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_scenario_and_paths() {
        let args = Args::parse_from([
            "ignite-cli",
            "scenario.jsonl",
            "--settings",
            "/tmp/settings.toml",
            "--session-file",
            "/tmp/session.json",
        ]);
        assert_eq!(args.scenario, Some(PathBuf::from("scenario.jsonl")));
        assert_eq!(args.settings, Some(PathBuf::from("/tmp/settings.toml")));
        assert_eq!(args.session_file, Some(PathBuf::from("/tmp/session.json")));
    }

    #[test]
    fn test_args_output_modes() {
        let args = Args::parse_from(["ignite-cli", "--json", "-q", "-v"]);
        assert!(args.json);
        assert!(args.quiet);
        assert!(args.verbose);
    }

    #[tokio::test]
    async fn test_read_scenario_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("steps.jsonl");
        std::fs::write(&path, "{\"type\":\"sign_out\"}\n").unwrap();

        let args = Args::parse_from(["ignite-cli", path.to_str().unwrap()]);
        let source = args.read_scenario().await.unwrap();
        assert!(source.contains("sign_out"));
    }

    #[tokio::test]
    async fn test_read_scenario_missing_file() {
        let args = Args::parse_from(["ignite-cli", "/nonexistent/steps.jsonl"]);
        assert!(args.read_scenario().await.is_err());
    }
}
