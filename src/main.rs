//! AgentBoard - Markdown status board for coordinated agents
//!
//! A CLI tool that reads the per-agent JSON status files written by
//! agent processes and renders them into a single Markdown board.
//!
//! Exit codes:
//!   0 - Success (skipped malformed status files included)
//!   1 - Invalid arguments, or the run failed and an error board was written

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod scanner;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cli::Args;
use config::Config;
use models::{BoardStatistics, StatusBoard};
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("AgentBoard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // A broken explicit config still needs an output path for the error board
    let (mut config, config_error) = match load_config(&args) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.merge_with_args(&args);

    let result = match config_error {
        Some(e) => Err(e),
        None => {
            let mut stdout = std::io::stdout();
            let dry_run_out: Option<&mut dyn Write> = if args.dry_run {
                Some(&mut stdout)
            } else {
                None
            };
            run_aggregation(&config, dry_run_out, Utc::now())
        }
    };

    match result {
        Ok(stats) => {
            print_summary(&config, &stats, args.dry_run);
            Ok(())
        }
        Err(e) => {
            error!("Aggregation failed: {:#}", e);
            eprintln!("\n❌ Error aggregating status: {:#}", e);

            if !args.dry_run {
                if let Err(write_err) =
                    write_error_board(&config.general.output, &e, Utc::now())
                {
                    error!("Could not write error board: {:#}", write_err);
                }
            }

            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .agentboard.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to change the status directory, output path, and report limits.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a dry-run board on stdout stays clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` that cannot be loaded is an error; a broken
/// default file only produces a warning.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Load the status directory and build the sorted board.
fn build_status_board(config: &Config, now: DateTime<Utc>) -> Result<StatusBoard> {
    let loader = scanner::StatusLoader::new(config.general.status_dir.clone());
    let records = loader.load(now)?;

    Ok(analysis::build_board(
        records,
        now,
        config.report.recent_completions,
    ))
}

/// Run one aggregation: load, sort, render and write the board.
///
/// With `dry_run_out` set, the board goes there instead of the output file
/// and nothing else is written to it. `now` is the single render timestamp
/// used for the whole board.
fn run_aggregation(
    config: &Config,
    dry_run_out: Option<&mut dyn Write>,
    now: DateTime<Utc>,
) -> Result<BoardStatistics> {
    let board = build_status_board(config, now)?;
    let markdown = report::generate_markdown_board(&board);

    match dry_run_out {
        Some(out) => {
            out.write_all(markdown.as_bytes())
                .context("Failed to print status board")?;
            out.flush().context("Failed to print status board")?;
        }
        None => report::write_board(&config.general.output, &markdown)?,
    }

    Ok(board.statistics)
}

/// Replace the output with the reduced error board.
fn write_error_board(output: &Path, err: &anyhow::Error, attempted_at: DateTime<Utc>) -> Result<()> {
    let board = report::generate_error_board(&format!("{:#}", err), attempted_at);
    report::write_board(output, &board)
}

fn print_summary(config: &Config, stats: &BoardStatistics, dry_run: bool) {
    // A dry run keeps stdout for the board itself.
    let lines = [
        if dry_run {
            format!(
                "\n✅ Dry run complete. {} was not written.",
                config.general.output.display()
            )
        } else {
            format!("✅ Status board updated: {}", config.general.output.display())
        },
        format!("   - {} active agents", stats.active),
        format!("   - {} blocked agents", stats.blocked),
        format!("   - {} idle agents", stats.idle),
    ];

    for line in &lines {
        if dry_run {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 9, 30, 0).unwrap()
    }

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.general.status_dir = root.join("agent-status");
        config.general.output = root.join("AGENT-STATUS.md");
        config
    }

    fn write_status(dir: &Path, name: &str, json: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), json).unwrap();
    }

    fn read_output(config: &Config) -> String {
        std::fs::read_to_string(&config.general.output).unwrap()
    }

    #[test]
    fn test_missing_directory_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());

        let stats = run_aggregation(&config, None, now()).unwrap();

        let entries: Vec<PathBuf> = std::fs::read_dir(&config.general.status_dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect();
        assert_eq!(entries.len(), 1);

        let placeholder = scanner::read_record(&entries[0]).unwrap().unwrap();
        assert_eq!(placeholder.agent_id(), "system");
        assert_eq!(placeholder.status.as_deref(), Some("idle"));

        assert_eq!(stats.total, 1);
        assert_eq!(stats.idle, 1);
    }

    #[test]
    fn test_empty_directory_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        std::fs::create_dir_all(&config.general.status_dir).unwrap();

        run_aggregation(&config, None, now()).unwrap();
        let board = read_output(&config);

        assert!(board.contains("**Last Updated:** 2025-05-20T09:30:00.000000Z\n"));
        assert!(board.contains("**Total Agents:** 1\n"));
        assert!(board.contains("## 💤 Idle Agents"));
        assert!(board.contains("| system | 2025-05-20T09:30 | Any task |"));
        assert!(!board.contains("Active Work"));
        assert!(!board.contains("Blocked Agents"));
        assert!(!board.contains("Recent Completions"));
    }

    #[test]
    fn test_malformed_file_does_not_abort_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let dir = &config.general.status_dir;

        write_status(dir, "broken.json", "{\"agentId\": \"broken\", ");
        write_status(
            dir,
            "worker.json",
            r#"{"agentId": "worker", "status": "in_progress", "task": "Index docs", "lane": "docs"}"#,
        );

        let stats = run_aggregation(&config, None, now()).unwrap();
        let board = read_output(&config);

        assert_eq!(stats.total, 1);
        assert!(board.contains("| worker | 🔄 in_progress | Index docs |"));
        assert!(!board.contains("broken"));
        assert!(board.contains("| docs | 1 | 0 | 0 | 1 |"));
    }

    #[test]
    fn test_existing_files_are_not_modified() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        let content = r#"{"agentId": "keeper", "status": "completed"}"#;
        write_status(&config.general.status_dir, "keeper.json", content);

        run_aggregation(&config, None, now()).unwrap();

        let after =
            std::fs::read_to_string(config.general.status_dir.join("keeper.json")).unwrap();
        assert_eq!(after, content);
        assert!(!config.general.status_dir.join("system.json").exists());
    }

    #[test]
    fn test_output_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        std::fs::write(&config.general.output, "stale board").unwrap();

        run_aggregation(&config, None, now()).unwrap();

        assert!(!read_output(&config).contains("stale board"));
    }

    #[test]
    fn test_dry_run_does_not_write_output() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());

        let mut out: Vec<u8> = Vec::new();
        run_aggregation(&config, Some(&mut out), now()).unwrap();

        assert!(!config.general.output.exists());
        assert!(config.general.status_dir.join("system.json").is_file());
    }

    #[test]
    fn test_dry_run_output_is_only_the_board() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        write_status(
            &config.general.status_dir,
            "worker.json",
            r#"{"agentId": "worker", "status": "waiting"}"#,
        );
        write_status(&config.general.status_dir, "broken.json", "{");

        let mut out: Vec<u8> = Vec::new();
        run_aggregation(&config, Some(&mut out), now()).unwrap();

        let printed = String::from_utf8(out).unwrap();
        let expected = report::generate_markdown_board(
            &build_status_board(&config, now()).unwrap(),
        );
        assert_eq!(printed, expected);
        assert!(printed.starts_with("# 🤖 Agent Status Board\n"));
        assert!(!printed.contains("broken.json"));
    }

    #[test]
    fn test_unwritable_output_fails_run() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path());
        config.general.output = temp_dir.path().join("no-such-dir").join("AGENT-STATUS.md");

        let err = run_aggregation(&config, None, now()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to write status board"));
    }

    #[test]
    fn test_status_path_is_a_file_fails_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path());
        std::fs::write(&config.general.status_dir, "not a directory").unwrap();

        assert!(run_aggregation(&config, None, now()).is_err());
    }

    #[test]
    fn test_write_error_board() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("AGENT-STATUS.md");
        std::fs::write(&output, "previous board").unwrap();

        let err = anyhow::anyhow!("disk full").context("Failed to write status board");
        write_error_board(&output, &err, now()).unwrap();

        let board = std::fs::read_to_string(&output).unwrap();
        assert!(board.starts_with("# 🤖 Agent Status Board\n"));
        assert!(board.contains(
            "**Error:** Could not aggregate status - Failed to write status board: disk full\n"
        ));
        assert!(board.contains("**Last Attempt:** 2025-05-20T09:30:00.000000Z\n"));
        assert!(!board.contains("previous board"));
    }

    #[test]
    fn test_recent_limit_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path());
        config.report.recent_completions = 2;

        for i in 0..4 {
            write_status(
                &config.general.status_dir,
                &format!("done-{}.json", i),
                &format!(r#"{{"agentId": "done-{}", "status": "completed"}}"#, i),
            );
        }

        let stats = run_aggregation(&config, None, now()).unwrap();
        let board = read_output(&config);

        assert_eq!(stats.completed, 4);
        assert!(board.contains("| done-1 | - | - | - |"));
        assert!(!board.contains("| done-2 | - | - | - |"));
        assert!(board.contains("- **Completed (recent):** 4\n"));
    }
}
