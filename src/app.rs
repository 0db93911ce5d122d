use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{error, info};

use crate::board::Board;
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::engine::{FilterState, TypeSelection};
use crate::loader::{LoadOptions, Loader, Source};
use crate::output::{self, OutputFormat, Report};
use crate::session::{self, Session};
use crate::utils::format_count;

fn flag_label(arg: &clap::Arg) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(short) = arg.get_short() {
        parts.push(format!("-{short}"));
    }
    // Prefer the readable alias over the short long-name.
    match arg.get_visible_aliases().and_then(|a| a.first().copied()) {
        Some(alias) => parts.push(format!("--{alias}")),
        None => {
            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }
        }
    }
    let mut label = parts.join(", ");
    if arg.get_action().takes_values() {
        let value_name = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        label.push_str(&format!(" <{value_name}>"));
    }
    label
}

/// Help grouped by heading, followed by the interactive command table and
/// the config file location.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default()
    );
    if let Some(long_about) = cmd.get_long_about().or(cmd.get_about()) {
        out.push_str(&format!("\n{long_about}\n"));
    }
    out.push_str(&format!("\nUsage: {} [OPTIONS]\n", cmd.get_name()));

    let mut sections: Vec<(&str, Vec<(String, String)>)> = Vec::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options");
        let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
        let entry = (flag_label(arg), help.trim().to_string());
        match sections.iter_mut().find(|(h, _)| *h == heading) {
            Some((_, entries)) => entries.push(entry),
            None => sections.push((heading, vec![entry])),
        }
    }

    let width = sections
        .iter()
        .flat_map(|(_, entries)| entries.iter().map(|(flag, _)| flag.len()))
        .max()
        .unwrap_or(0);
    for (heading, entries) in sections {
        out.push_str(&format!("\n{heading}:\n"));
        for (flag, help) in entries {
            out.push_str(&format!("  {flag:<width$}  {help}\n"));
        }
    }

    out.push_str("\nInteractive ");
    for line in session::HELP.lines() {
        out.push_str(line);
        out.push('\n');
    }

    let config_path = config::default_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.graderboard/config.yml".to_string());
    out.push_str(&format!("\nConfig: {config_path} (CLI flags take precedence)\n"));
    out
}

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone)]
struct RunConfig {
    source: Source,
    load: LoadOptions,
    /// `None` selects every type present in the dataset.
    types: Option<Vec<String>>,
    search: String,
    expand: bool,
    list_types: bool,
    interactive: bool,
    output: Option<PathBuf>,
    output_format: OutputFormat,
    color: bool,
    force_color: bool,
}

impl RunConfig {
    fn initial_filter(&self, board: &Board) -> FilterState {
        FilterState {
            search: self.search.clone(),
            types: match self.types.as_ref() {
                Some(prefixes) => TypeSelection::from_prefixes(prefixes.iter().cloned()),
                None => TypeSelection::all(board.dataset()),
            },
        }
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let force_color = args.color;
    let color = if args.color {
        true
    } else {
        !(args.no_color || cfg.no_color.unwrap_or(false))
    };

    let source = args
        .source
        .or(cfg.source)
        .map(|raw| Source::parse(&raw))
        .unwrap_or_default();

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let types = if args.no_types {
        Some(Vec::new())
    } else if !args.types.is_empty() {
        Some(crate::utils::collect_types(&args.types)?)
    } else {
        match cfg.types {
            Some(values) => Some(
                crate::utils::collect_types(&values)
                    .map_err(|e| format!("invalid types in config: {e}"))?,
            ),
            None => None,
        }
    };

    let search = args.search.or(cfg.search).unwrap_or_default();
    let expand = args.expand || cfg.expand.unwrap_or(false);

    let output = if args.interactive {
        None
    } else {
        args.output.or(cfg.output).map(|p| config::expand_tilde(&p))
    };

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_ref()
            .and_then(|p| output::infer_format_from_path(&p.to_string_lossy()))
            .unwrap_or(OutputFormat::Text),
    };

    Ok(RunConfig {
        source,
        load: LoadOptions {
            timeout_seconds,
            proxy,
        },
        types,
        search,
        expand,
        list_types: args.list_types,
        interactive: args.interactive,
        output,
        output_format,
        color,
        force_color,
    })
}

async fn write_output(run: &RunConfig, bytes: &[u8]) -> Result<(), String> {
    match run.output.as_ref() {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    format!("failed to create output directory '{}': {e}", parent.display())
                })?;
            }
            tokio::fs::write(path, bytes)
                .await
                .map_err(|e| format!("failed to write output file '{}': {e}", path.display()))?;
            info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(bytes)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }
    Ok(())
}

fn render_type_listing(board: &Board) -> String {
    let totals = board.dataset().type_totals();
    if totals.is_empty() {
        return "no assignment types found\n".to_string();
    }
    let width = totals.iter().map(|(t, _)| t.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (prefix, total) in totals {
        out.push_str(&format!("{prefix:<width$}  {}\n", format_count(total)));
    }
    out
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.force_color {
        colored::control::set_override(true);
    } else if !run.color {
        colored::control::set_override(false);
    }
    // Colors only reach a terminal; files always get plain text.
    let color = run.color && run.output.is_none();

    info!("source: {}", run.source);
    let loader = Loader::new(&run.load).map_err(|e| e.to_string())?;
    let loaded = match loader.load(&run.source).await {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            let report = Report::load_failed();
            write_output(&run, &output::render(&report, run.output_format, color)).await?;
            return Err(format!("could not load dataset from {}", run.source));
        }
    };

    let board = Board::from_loaded(loaded);
    let filter = run.initial_filter(&board);

    if run.list_types {
        return write_output(&run, render_type_listing(&board).as_bytes()).await;
    }

    if run.interactive {
        let mut session = Session::new(board, filter);
        if run.expand {
            session.expand_all();
        }
        let stdin = BufReader::new(tokio::io::stdin());
        return session::run(&mut session, stdin, tokio::io::stdout(), run.color)
            .await
            .map_err(|e| format!("interactive session failed: {e}"));
    }

    let mut leaderboard = board.leaderboard(&filter);
    if run.expand {
        leaderboard.expand_all();
    }
    info!(
        "rendering {} rows ({:?}) as {:?}",
        leaderboard.rows.len(),
        leaderboard.mode,
        run.output_format
    );
    let report = Report::ready(&board, &filter, leaderboard);
    write_output(&run, &output::render(&report, run.output_format, color)).await
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    crate::utils::init_logging(args.verbose);

    let user_config_path = args.config.as_deref().map(config::expand_tilde);

    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine home directory for config".to_string())?;
        if config::ensure_default_config_file(&path)? {
            println!("wrote default config to {}", path.display());
        } else {
            println!("config already exists at {}", path.display());
        }
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["graderboard"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("graderboard-app-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const DATA: &str = r#"{
        "Alice": {"statistics": {"totalGradedFields": 1200}, "gradedAssignments": {"Worksheet_1": 6, "Quiz_1": 4}},
        "Bob": {"statistics": {"totalGradedFields": 34}, "gradedAssignments": {"Worksheet_1": 5}}
    }"#;

    #[test]
    fn defaults_select_every_type_from_default_source() {
        let run = build_run_config(args(&[]), ConfigFile::default()).unwrap();
        assert_eq!(run.source, Source::default());
        assert!(run.types.is_none());
        assert_eq!(run.search, "");
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.load.timeout_seconds, 10);
        assert!(run.color);
    }

    #[test]
    fn cli_values_override_config() {
        let cfg = ConfigFile {
            source: Some("https://example.com/a.json".to_string()),
            types: Some(vec!["Quiz".to_string()]),
            search: Some("bob".to_string()),
            timeout: Some(30),
            no_color: Some(true),
            ..ConfigFile::default()
        };
        let run = build_run_config(
            args(&["-s", "./local.json", "-t", "Worksheet", "-q", "ali", "-T", "5"]),
            cfg.clone(),
        )
        .unwrap();
        assert_eq!(run.source, Source::File(PathBuf::from("./local.json")));
        assert_eq!(run.types, Some(vec!["Worksheet".to_string()]));
        assert_eq!(run.search, "ali");
        assert_eq!(run.load.timeout_seconds, 5);
        assert!(!run.color);

        let run = build_run_config(args(&["-c"]), cfg).unwrap();
        assert_eq!(run.source, Source::Url("https://example.com/a.json".to_string()));
        assert_eq!(run.types, Some(vec!["Quiz".to_string()]));
        assert!(run.color);
    }

    #[test]
    fn no_types_selects_nothing() {
        let run = build_run_config(args(&["--no-types"]), ConfigFile::default()).unwrap();
        assert_eq!(run.types, Some(Vec::new()));
    }

    #[test]
    fn output_format_is_inferred_from_extension() {
        let run = build_run_config(args(&["-o", "board.html"]), ConfigFile::default()).unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);
        let run = build_run_config(args(&["-o", "board.html", "-A", "json"]), ConfigFile::default())
            .unwrap();
        assert_eq!(run.output_format, OutputFormat::Json);
    }

    #[test]
    fn bad_config_values_are_rejected() {
        let cfg = ConfigFile {
            output_format: Some("pdf".to_string()),
            ..ConfigFile::default()
        };
        assert!(build_run_config(args(&[]), cfg).is_err());
        let cfg = ConfigFile {
            timeout: Some(0),
            ..ConfigFile::default()
        };
        assert!(build_run_config(args(&[]), cfg).is_err());
    }

    #[test]
    fn help_lists_every_heading() {
        let help = render_custom_help();
        for heading in ["Output:", "Input:", "Filters:", "View:", "HTTP:"] {
            assert!(help.contains(heading), "missing {heading}");
        }
        assert!(help.contains("-q, --search <TERM>"));
        assert!(help.contains("Interactive commands:"));
        assert!(help.contains("open <n|name>"));
        assert!(help.contains("Config: "));
    }

    #[tokio::test]
    async fn renders_json_report_to_file() {
        let dir = temp_dir("json");
        let data = dir.join("graders.json");
        std::fs::write(&data, DATA).unwrap();
        let out = dir.join("board.json");
        let run = build_run_config(
            args(&["-s", &data.to_string_lossy(), "-o", &out.to_string_lossy(), "-t", "Worksheet"]),
            ConfigFile::default(),
        )
        .unwrap();
        run_async(run).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["team_total"], 1234);
        let rows = json["leaderboard"]["rows"].as_array().unwrap();
        assert_eq!(rows[0]["name"], "Alice");
        assert_eq!(rows[0]["filtered_score"], 6);
        assert_eq!(rows[1]["name"], "Bob");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn load_failure_writes_placeholder_and_errors() {
        let dir = temp_dir("missing");
        let out = dir.join("board.txt");
        let run = build_run_config(
            args(&["-s", &dir.join("nope.json").to_string_lossy(), "-o", &out.to_string_lossy()]),
            ConfigFile::default(),
        )
        .unwrap();
        assert!(run_async(run).await.is_err());
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains(output::LOAD_ERROR_MESSAGE));
        assert!(!text.contains("Team Total"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn list_types_prints_totals() {
        let dir = temp_dir("types");
        let data = dir.join("graders.json");
        std::fs::write(&data, DATA).unwrap();
        let out = dir.join("types.txt");
        let run = build_run_config(
            args(&["-s", &data.to_string_lossy(), "-o", &out.to_string_lossy(), "-l"]),
            ConfigFile::default(),
        )
        .unwrap();
        run_async(run).await.unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text, "Worksheet  11\nQuiz       4\n");
        let _ = std::fs::remove_dir_all(dir);
    }
}
