use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagepick::document::{DocumentSession, DocumentSessionState, SessionConfig};
use pagepick::event_source::{EventSource, ScriptedEventSource};
use pagepick::export::export_pages;
use pagepick::orchestrator::{FileInput, SessionOrchestrator};
use pagepick::panic_handler;
use pagepick::selection::SelectionReport;
use pagepick::settings;
use pagepick::status::{StatusLevel, StatusSink, StatusUpdate};

/// Render a PDF and pick rectangular regions on its pages
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// PDF file to load
    file: PathBuf,

    /// Replay a selection gesture, PAGE:X,Y[:X,Y...][:leave] (repeatable)
    #[arg(short, long = "select", value_name = "GESTURE")]
    select: Vec<String>,

    /// Write each rendered page as a PNG into this directory
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Print selection reports as JSON lines
    #[arg(long)]
    json: bool,

    /// Settings file (default: <config dir>/pagepick/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the display scale (display pixels per PDF point)
    #[arg(long)]
    scale: Option<f32>,

    /// Log file
    #[arg(long, default_value = "pagepick.log")]
    log_file: PathBuf,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

/// Status lines go to stderr, selection reports to stdout
struct ConsoleSink {
    json: bool,
}

impl StatusSink for ConsoleSink {
    fn status(&mut self, update: StatusUpdate) {
        match update.level {
            StatusLevel::Info => info!("{}", update.message),
            StatusLevel::Warning => log::warn!("{}", update.message),
            StatusLevel::Error => error!("{}", update.message),
        }
        eprintln!("{}", update.message);
    }

    fn selection(&mut self, report: &SelectionReport) {
        if self.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("Failed to serialize selection report: {e}"),
            }
        } else {
            println!("{report}");
        }
    }
}

#[cfg(feature = "pdf")]
fn open_session(config: SessionConfig) -> Result<DocumentSession> {
    Ok(DocumentSession::with_config(
        pagepick::document::MupdfSource::new(),
        config,
    ))
}

#[cfg(not(feature = "pdf"))]
fn open_session(_config: SessionConfig) -> Result<DocumentSession> {
    bail!("pagepick was built without PDF support (enable the `pdf` feature)")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {:?}", cli.log_file))?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("Starting pagepick");

    settings::load_settings(cli.config.as_deref());
    if let Some(scale) = cli.scale {
        settings::set_display_scale(scale);
    }
    let settings = settings::current();

    let mut gestures =
        ScriptedEventSource::from_gestures(&cli.select).context("invalid --select gesture")?;

    let result = run(&cli, &settings, &mut gestures);
    if let Err(e) = &result {
        error!("{e:#}");
    }
    info!("Shutting down pagepick");
    result
}

fn run(cli: &Cli, settings: &settings::Settings, gestures: &mut impl EventSource) -> Result<()> {
    let bytes = fs::read(&cli.file).with_context(|| format!("cannot read {:?}", cli.file))?;
    let name = display_name(&cli.file);

    let session = open_session(settings.session_config())?;
    let mut orchestrator = SessionOrchestrator::new(session, ConsoleSink { json: cli.json });

    let mut input = FileInput::new(name.clone(), bytes);
    // Files without a .pdf extension are still accepted when the header says PDF
    if input.bytes.starts_with(b"%PDF") {
        input = input.with_mime("application/pdf");
    }
    orchestrator.on_file_selected(vec![input])?;
    orchestrator.wait_until_settled()?;

    if let DocumentSessionState::Failed { reason } = orchestrator.session().state() {
        bail!("failed to load {name}: {reason}");
    }

    if let Some(dir) = cli.export_dir.clone().or_else(|| settings.export_dir.clone()) {
        for path in export_pages(&name, orchestrator.session().surfaces(), &dir)? {
            eprintln!("Wrote {}", path.display());
        }
    }

    let now = Instant::now();
    while gestures.poll(Duration::ZERO)? {
        let event = gestures.read()?;
        if orchestrator.session().surface(event.page).is_none() {
            eprintln!("Page {} is not available, ignoring gesture event", event.page);
            continue;
        }
        orchestrator.on_pointer(event.page, event.event, now);
    }
    orchestrator.tick(now + Duration::from_millis(settings.overlay_hide_delay_ms));

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
