//! Headless PC host for the chat backdrop.
//!
//! Single-threaded page simulation: the same orchestrator, generators and
//! lifecycle manager the widget uses, driven by a scripted input schedule and
//! drawn into a software framebuffer.

#[allow(dead_code)]
mod headless;
#[allow(dead_code)]
mod input;
mod session;

use clap::{Args, Parser, Subcommand};
use std::process;

use backdrop_core::ThemeRegistry;
use backdrop_hal::InputEvent;

use session::{run_session, SessionConfig};

#[derive(Parser)]
#[command(name = "backdrop-pc")]
#[command(about = "Run the themed particle backdrop headlessly", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress progress output (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a page session and report frame statistics
    Run(RunArgs),
    /// List registered themes
    Themes,
}

#[derive(Args)]
struct RunArgs {
    /// Theme to start on (defaults to the registry default)
    #[arg(short, long)]
    theme: Option<String>,

    /// Number of display refreshes to simulate
    #[arg(short, long, default_value = "600")]
    frames: u64,

    /// Surface size in CSS pixels, as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720", value_parser = parse_size)]
    size: (u32, u32),

    /// Device pixel ratio reported by the surface
    #[arg(long, default_value = "1.0")]
    dpr: f32,

    /// PRNG seed for particle placement
    #[arg(long, default_value = "24301")]
    seed: u64,

    /// Frame at which the assistant starts typing
    #[arg(long)]
    typing_from: Option<u64>,

    /// Frame at which the assistant stops typing
    #[arg(long)]
    typing_until: Option<u64>,

    /// Resize the surface, as FRAME:WIDTHxHEIGHT (repeatable)
    #[arg(long, value_parser = parse_resize)]
    resize_at: Vec<(u64, u32, u32)>,

    /// Press the theme toggle at FRAME (repeatable)
    #[arg(long)]
    toggle_at: Vec<u64>,

    /// Select a theme by index, as FRAME:INDEX (repeatable)
    #[arg(long, value_parser = parse_select)]
    select_at: Vec<(u64, u8)>,

    /// Fail the Nth present call to exercise recovery
    #[arg(long)]
    fail_present: Option<u64>,

    /// Refuse the first N context acquisitions
    #[arg(long, default_value = "0")]
    refuse_contexts: u32,

    /// Print an ASCII rendering of the final frame
    #[arg(long)]
    preview: bool,

    /// Preview size in characters, as COLSxROWS
    #[arg(long, default_value = "72x24", value_parser = parse_size)]
    preview_size: (u32, u32),
}

impl RunArgs {
    fn session_config(&self) -> SessionConfig {
        let mut events = Vec::new();
        if let Some(frame) = self.typing_from {
            events.push((frame, InputEvent::SetTyping(true)));
        }
        if let Some(frame) = self.typing_until {
            events.push((frame, InputEvent::SetTyping(false)));
        }
        for &(frame, width, height) in &self.resize_at {
            events.push((frame, InputEvent::Resize { width, height }));
        }
        for &frame in &self.toggle_at {
            events.push((frame, InputEvent::ToggleTheme));
        }
        for &(frame, index) in &self.select_at {
            events.push((frame, InputEvent::SelectTheme(index)));
        }

        SessionConfig {
            theme: self.theme.clone(),
            frames: self.frames,
            width: self.size.0,
            height: self.size.1,
            device_pixel_ratio: self.dpr,
            seed: self.seed,
            events,
            fail_present_at: self.fail_present,
            refuse_contexts: self.refuse_contexts,
        }
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok((w, h))
}

fn parse_resize(s: &str) -> Result<(u64, u32, u32), String> {
    let (frame, size) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:WIDTHxHEIGHT, got {s:?}"))?;
    let frame = frame.parse().map_err(|e| format!("bad frame {frame:?}: {e}"))?;
    let (w, h) = parse_size(size)?;
    Ok((frame, w, h))
}

fn parse_select(s: &str) -> Result<(u64, u8), String> {
    let (frame, index) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FRAME:INDEX, got {s:?}"))?;
    let frame = frame.parse().map_err(|e| format!("bad frame {frame:?}: {e}"))?;
    let index = index.parse().map_err(|e| format!("bad index {index:?}: {e}"))?;
    Ok((frame, index))
}

fn list_themes() {
    let registry = ThemeRegistry::builtin();
    let default = registry.default_theme().id;
    for (i, entry) in registry.iter().enumerate() {
        println!(
            "{i}: {:<6} {:<10} {:<13} {:?}{}",
            entry.id,
            entry.name,
            entry.stylesheet,
            entry.generator,
            if entry.id == default { " (default)" } else { "" }
        );
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging (suppressed if --quiet)
    if !cli.quiet {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let args = match cli.command {
        Commands::Themes => {
            list_themes();
            return;
        }
        Commands::Run(args) => args,
    };

    let mut report = match run_session(&args.session_config()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if args.preview {
        let (cols, rows) = args.preview_size;
        match report.host.ascii_preview(cols, rows) {
            Some(text) => print!("{text}"),
            None => eprintln!("Nothing to preview"),
        }
    }

    let totals = report.totals;
    let state = report.final_state();
    report.themes.shutdown(&mut report.host);

    if !cli.quiet {
        eprintln!(
            "Done: {} frames, {} rendered, {} recovered, {} degraded, {} switches ({} rejected), {} failed resizes; final theme {} {:?}",
            totals.frames,
            totals.rendered,
            totals.recovered,
            totals.degraded,
            totals.switches,
            totals.rejected_switches,
            totals.failed_resizes,
            report.themes.current_theme(),
            state
        );
    }
}
