use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::gallery::ToggleEvent;
use crate::logging::{self, LogConfig};
use crate::output::terminal::TerminalPage;
use crate::output::{self, OutputFormat, RecordExport};
use crate::session::{DisplayMode, LoadState};
use crate::transport::ClientConfig;
use crate::utils::format_bool;
use crate::viewer::{Control, Options, ViewSummary, Viewer, DEFAULT_POLL_INTERVAL};

const DEFAULT_ROWS: usize = 20;
const DEFAULT_TIMEOUT: usize = 10;
const DEFAULT_APP: &str = "turtle";

fn print_banner() {
    println!(
        "{} {}",
        "galleryview".bold(),
        concat!("v", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }
    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push_str("\nUsage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    // headings keep the order in which their first option was declared
    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options").to_string();
        let idx = *section_idx.entry(heading.clone()).or_insert_with(|| {
            sections.push((heading, Vec::new()));
            sections.len() - 1
        });
        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");
        for arg in args {
            out.push_str("  ");
            out.push_str(&render_flags(arg));
            out.push('\n');
            if let Some(help) = arg.get_help().map(|h| h.to_string()) {
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    }

    out
}

fn render_flags(arg: &clap::Arg) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(short) = arg.get_short() {
        parts.push(format!("-{short}"));
    }
    if let Some(long) = arg.get_long() {
        parts.push(format!("--{long}"));
    }
    for alias in arg.get_visible_aliases().unwrap_or_default() {
        let rendered = format!("--{alias}");
        if !parts.contains(&rendered) {
            parts.push(rendered);
        }
    }

    let mut flags = parts.join(", ");
    if arg.get_action().takes_values() {
        let value_name = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        flags.push_str(&format!(" <{value_name}>"));
    }
    flags
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    viewport_rows: Option<usize>,
    interactive: bool,
    output: Option<String>,
    output_format: OutputFormat,
    toggles: Vec<ToggleEvent>,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };
    let verbose = if args.verbose > 0 {
        args.verbose
    } else {
        cfg.verbose.unwrap_or(0)
    };

    let base_url = args
        .url
        .or(cfg.base_url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            "a gallery URL must be specified (--url, or base_url in the config file)".to_string()
        })?;
    let app = args
        .app
        .or(cfg.app)
        .unwrap_or_else(|| DEFAULT_APP.to_string());

    let viewport_rows = if let Some(rows) = args.rows {
        Some(rows)
    } else if args.all {
        None
    } else if let Some(rows) = cfg.rows {
        Some(rows)
    } else if cfg.all.unwrap_or(false) {
        None
    } else {
        Some(DEFAULT_ROWS)
    };
    if viewport_rows == Some(0) {
        return Err("invalid rows in config, expected positive integer".to_string());
    }

    let poll_ms = args.poll_interval.or(cfg.poll_interval_ms);
    let poll_interval = match poll_ms {
        Some(0) => return Err("invalid poll_interval_ms in config, expected positive".to_string()),
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_POLL_INTERVAL,
    };
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT);
    if timeout == 0 {
        return Err("invalid timeout in config, expected positive seconds".to_string());
    }
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());
    if let Some(raw) = header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?;
    }

    let output = args
        .output
        .or(cfg.output)
        .filter(|o| !o.trim().is_empty())
        .map(|o| config::expand_tilde_string(&o));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let toggles: Vec<ToggleEvent> = args
        .publish
        .iter()
        .map(|key| toggle_for(key, true))
        .chain(args.unpublish.iter().map(|key| toggle_for(key, false)))
        .collect();
    let interactive = toggles.is_empty() && (args.interactive || cfg.interactive.unwrap_or(false));

    Ok(RunConfig {
        options: Options {
            base_url,
            app,
            poll_interval,
            client: ClientConfig {
                timeout_seconds: timeout,
                proxy,
                header,
            },
        },
        viewport_rows,
        interactive,
        output,
        output_format,
        toggles,
        no_color,
        verbose,
    })
}

/// Accepts a bare key or a `publish_<key>` checkbox id.
fn toggle_for(raw: &str, public: bool) -> ToggleEvent {
    let raw = raw.trim();
    ToggleEvent::from_checkbox(raw, public).unwrap_or_else(|| ToggleEvent::new(raw, public))
}

/// Reads stdin line by line: `q` quits, anything else scrolls one viewport.
fn spawn_controls(rows: usize) -> mpsc::Receiver<Control> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let control = match line.trim() {
                "q" | "quit" => Control::Quit,
                _ => Control::Scroll(rows),
            };
            if tx.send(control).await.is_err() || control == Control::Quit {
                break;
            }
        }
    });
    rx
}

fn describe_state(summary: &ViewSummary) -> String {
    match summary.state {
        LoadState::Exhausted if summary.redirected => "login required".to_string(),
        LoadState::Exhausted => "end of gallery".to_string(),
        LoadState::IdleMore => match summary.cursor.as_deref() {
            Some(cursor) => format!("more available (cursor {cursor})"),
            None => "more available".to_string(),
        },
        LoadState::Loading => "interrupted while loading".to_string(),
    }
}

async fn run_toggles(viewer: &Viewer, toggles: &[ToggleEvent]) {
    for event in toggles {
        let label = if event.public { "Publish" } else { "Unpublish" };
        format_kv_line(label, &event.key);
    }
    viewer.set_published(toggles).await;
    println!();
    println!(":: Completed :: sent {} toggle(s) ::", toggles.len());
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    logging::init_logging(&LogConfig::from_verbosity(run.verbose).with_ansi(!run.no_color))?;
    print_banner();

    let viewer = Viewer::new(run.options.clone()).map_err(|e| e.to_string())?;
    let session = viewer.session().map_err(|e| e.to_string())?;
    let mode = session.display_mode();

    format_kv_line("URL", viewer.endpoints().base().as_str());
    format_kv_line("App", session.app().as_str());
    if !run.toggles.is_empty() {
        run_toggles(&viewer, &run.toggles).await;
        return Ok(());
    }

    let rows_label = run
        .viewport_rows
        .map(|r| r.to_string())
        .unwrap_or_else(|| "all".to_string());
    format_kv_line("Rows", &rows_label);
    format_kv_line("Interactive", format_bool(run.interactive));
    format_kv_line(
        "Mode",
        match mode {
            DisplayMode::Public => "public",
            DisplayMode::Admin => "admin",
        },
    );
    if let Some(path) = run.output.as_deref() {
        format_kv_line("Output", &format!("{path} ({})", run.output_format.label()));
    }
    println!();
    let heading = session.app().label();
    if !heading.is_empty() {
        println!("{}", heading.bold().underline());
    }

    let mut page = TerminalPage::stdout(mode, run.viewport_rows);
    if let Some(path) = run.output.as_deref() {
        page = page.with_export(RecordExport::create(
            Path::new(path),
            run.output_format,
            mode,
        )?);
    }
    let controls = run
        .interactive
        .then(|| spawn_controls(run.viewport_rows.unwrap_or(DEFAULT_ROWS)));

    let (mut page, summary) = viewer
        .run(page, controls)
        .await
        .map_err(|e| e.to_string())?;
    let exported = page
        .finish()
        .map_err(|e| format!("failed to write output: {e}"))?;

    println!();
    if let (Some(count), Some(path)) = (exported, run.output.as_deref()) {
        format_kv_line("Saved", &format!("{count} record(s) to {path}"));
    }
    format_kv_line("State", &describe_state(&summary));
    println!(
        ":: Completed :: {} record(s) in {} request(s), {}s ::",
        summary.rendered,
        summary.requests,
        summary.elapsed.as_secs()
    );

    Ok(())
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory for config".to_string())?,
    };
    let created = config::ensure_default_config_file(&path)?;
    let status = if created { "created" } else { "exists" };
    format_kv_line("Config", &format!("{} ({status})", path.display()));
    Ok(())
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

    if args.init_config {
        return init_config(&args);
    }

    let cfg = match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    let result = rt.block_on(run_async(run));
    // the stdin reader may still be parked on a read
    rt.shutdown_timeout(Duration::from_millis(250));
    result
}
