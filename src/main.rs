// Copyright (c) 2026 rezky_nightky

mod audio;
mod cell;
mod config;
mod engine;
mod error;
mod factory;
mod frame;
mod hud;
mod overlay;
mod palette;
mod particle;
mod physics;
mod present;
mod raster;
mod renderer;
mod runtime;
mod scheduler;
mod sky;
#[cfg(feature = "sound")]
mod sound;
mod soundscape;
mod surface;
mod synth;
mod terminal;
mod viewport;

use std::env;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::audio::Deck;
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, next_preset, print_help_detail,
    print_list_modes, require_range, Args, PRESETS,
};
use crate::engine::FrameReport;
use crate::error::{FxError, Result};
use crate::frame::Frame;
use crate::hud::{badge_lines, draw_badge, Status};
use crate::overlay::Overlay;
use crate::present::{compose, PresentOptions};
use crate::raster::PixmapSurface;
use crate::runtime::{detect_color_mode_auto, ColorMode};
use crate::scheduler::{Scheduler, TaskKind};
use crate::terminal::{restore_terminal_best_effort, Terminal};
use crate::viewport::ViewportChange;

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

// Longest wait between input polls when nothing is scheduled (paused).
const IDLE_POLL: Duration = Duration::from_millis(100);

#[cfg(feature = "sound")]
type HostTrack = sound::SinkTrack;
#[cfg(not(feature = "sound"))]
type HostTrack = audio::VirtualTrack;

type SkyOverlay = Overlay<PixmapSurface, HostTrack>;

// The returned guard keeps the output device open.
#[cfg(feature = "sound")]
fn open_deck() -> (Deck<HostTrack>, Option<rodio::OutputStream>) {
    sound::open_deck()
}

#[cfg(not(feature = "sound"))]
fn open_deck() -> (Deck<HostTrack>, Option<()>) {
    info!("built without the sound feature; soundscape runs silently");
    (Deck::virtual_deck(), None)
}

fn build_info() -> &'static str {
    env!("SKYFX_BUILD")
}

fn git_sha() -> &'static str {
    env!("SKYFX_GIT_SHA")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        Some(v) => ColorMode::from_flag(v).unwrap_or_else(|| {
            eprintln!("invalid --colormode: {} (allowed: 0,16,8,256,24,32)", v);
            std::process::exit(1);
        }),
        None => detect_color_mode_auto(),
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| FxError::LogFile {
        path: path.to_path_buf(),
        source,
    })?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| FxError::Subscriber(e.to_string()))
}

fn install_signal_handlers() {
    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

#[derive(Default)]
struct PerfStats {
    frames: u64,
    drawn_frames: u64,
    rebuilds: u64,
    particles_sum: u64,
    dt_sum_s: f64,
    work_sum_s: f64,
    work_max_s: f32,
    overshoot_frames: u64,
}

impl PerfStats {
    fn record(&mut self, report: &FrameReport, drawn: bool, work_s: f32, period_s: f32) {
        self.frames = self.frames.saturating_add(1);
        if drawn {
            self.drawn_frames = self.drawn_frames.saturating_add(1);
        }
        if report.rebuilt {
            self.rebuilds = self.rebuilds.saturating_add(1);
        }
        self.particles_sum = self.particles_sum.saturating_add(report.particles as u64);
        self.dt_sum_s += report.dt as f64;
        self.work_sum_s += work_s as f64;
        self.work_max_s = self.work_max_s.max(work_s);
        if work_s > period_s {
            self.overshoot_frames = self.overshoot_frames.saturating_add(1);
        }
    }

    fn print(&self, elapsed: Duration, target_fps: f64) {
        let elapsed_s = elapsed.as_secs_f64().max(0.000_001);
        let frames = self.frames.max(1) as f64;
        let pct = |n: u64| (n as f64) / frames * 100.0;

        println!("PERF STATS:");
        println!("  elapsed_s: {:.3}", elapsed_s);
        println!("  target_fps: {:.3}", target_fps);
        println!("  avg_fps: {:.3}", self.frames as f64 / elapsed_s);
        println!("  frames: {}", self.frames);
        println!(
            "  drawn_frames: {} ({:.1}%)",
            self.drawn_frames,
            pct(self.drawn_frames)
        );
        println!("  avg_dt_ms: {:.3}", self.dt_sum_s / frames * 1000.0);
        println!("  avg_work_ms: {:.3}", self.work_sum_s / frames * 1000.0);
        println!("  max_work_ms: {:.3}", self.work_max_s as f64 * 1000.0);
        println!(
            "  overshoot_frames: {} ({:.1}%)",
            self.overshoot_frames,
            pct(self.overshoot_frames)
        );
        println!("  avg_particles: {:.1}", self.particles_sum as f64 / frames);
        println!("  rebuilds: {}", self.rebuilds);
    }
}

struct Host {
    term: Terminal,
    frame: Frame,
    sched: Scheduler,
    overlay: SkyOverlay,
    present: PresentOptions,
    hud: bool,
    scale: f32,
    running: bool,
}

impl Host {
    fn handle_key(&mut self, k: KeyEvent, screensaver: bool, now: Duration) {
        self.overlay.unlock(&mut self.sched);
        if screensaver {
            self.running = false;
            return;
        }

        match (k.code, k.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.running = false,
            (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => self.running = false,
            (KeyCode::Char('m'), _) => {
                self.overlay.toggle_mute(&mut self.sched);
            }
            (KeyCode::Char(d @ '1'..='5'), _) => {
                let i = d as usize - '1' as usize;
                self.overlay.set_condition(PRESETS[i], &mut self.sched);
            }
            (KeyCode::Char('c'), _) => {
                let next = next_preset(self.overlay.condition());
                self.overlay.set_condition(next, &mut self.sched);
            }
            (KeyCode::Char('p'), _) => {
                if self.overlay.is_paused() {
                    self.overlay.resume(now, &mut self.sched);
                } else {
                    self.overlay.pause(&mut self.sched);
                }
            }
            (KeyCode::Char(' '), _) => self.overlay.engine_mut().regenerate(),
            _ => {}
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.frame = Frame::new(cols, rows);
        let vp = self
            .overlay
            .engine_mut()
            .resize(ViewportChange::from_terminal(cols, rows, self.scale));
        info!(cols, rows, width = vp.width, height = vp.height, "terminal resized");
    }

    fn draw_hud(&mut self) {
        if !self.hud {
            return;
        }
        let status = Status {
            condition: self.overlay.condition(),
            mode: self.overlay.mode(),
            sound: self.overlay.sound_state(),
            paused: self.overlay.is_paused(),
        };
        let lines = badge_lines(&status);
        draw_badge(
            &mut self.frame,
            &lines,
            self.overlay.mode(),
            self.present.color_mode,
        );
    }

    fn render(&mut self) -> Result<bool> {
        if let Some(surface) = self.overlay.engine().surface() {
            compose(
                &mut self.frame,
                surface.pixmap(),
                self.overlay.mode(),
                &self.present,
            );
        }
        self.draw_hud();
        Ok(self.term.draw(&mut self.frame)?)
    }
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    if let Err(e) = run() {
        restore_terminal_best_effort();
        eprintln!("skyfx: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    install_signal_handlers();

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_modes {
        print_list_modes();
        return Ok(());
    }

    if args.help_detail {
        print_help_detail();
        return Ok(());
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);
        let or_unset = |s: &str| if s.is_empty() { "(unset)".to_string() } else { s.to_string() };

        println!("BITCOLOR CHECK:");
        println!("  COLORTERM: {}", or_unset(&colorterm));
        println!("  TERM: {}", or_unset(&term));
        println!("  auto_detected: {}", auto.label());
        if args.colormode.is_some() {
            println!("  forced: {}", effective.label());
        }
        println!("  effective: {}", effective.label());
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        if !git_sha().is_empty() {
            println!("Commit: {}", git_sha());
        }
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let color_mode = detect_color_mode(&args);
    let target_fps = require_range("--fps", args.fps, 1.0, 240.0);
    let scale = require_range("--scale", args.scale, 0.25, 4.0);
    let duration = match args.duration {
        Some(s) if !s.is_finite() => {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        Some(s) if s > 0.0 => Some(Duration::from_secs_f64(require_range(
            "--duration",
            s,
            0.1,
            86400.0,
        ))),
        _ => None,
    };

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let term = Terminal::new()?;
    let (cols, rows) = term.size()?;

    let (deck, _audio_out) = open_deck();
    let overlay = Overlay::new(
        &args.weather,
        ViewportChange::from_terminal(cols, rows, scale),
        deck,
        !args.sound,
        rng,
    );
    let vp = overlay.engine().viewport();
    let surface = PixmapSurface::new(vp.width, vp.height, vp.half_cell_scale()).ok_or(
        FxError::Surface {
            width: vp.width,
            height: vp.height,
        },
    )?;

    info!(
        condition = args.weather.as_str(),
        mode = overlay.mode().label(),
        cols,
        rows,
        fps = target_fps,
        color = color_mode.label(),
        "starting"
    );

    let period = Duration::from_secs_f64(1.0 / target_fps);
    let mut host = Host {
        term,
        frame: Frame::new(cols, rows),
        sched: Scheduler::new(period),
        overlay,
        present: PresentOptions {
            color_mode,
            vignette: !args.no_vignette,
            grain: !args.no_grain,
        },
        hud: !args.no_hud,
        scale,
        running: true,
    };

    let start = Instant::now();
    if !host.overlay.start(surface, host.sched.now(), &mut host.sched) {
        warn!("effects did not start");
    }

    let mut stats = PerfStats::default();
    let mut audio_clock = Duration::ZERO;
    let period_s = host.sched.frame_period().as_secs_f32();

    while host.running {
        let elapsed = start.elapsed();
        if duration.is_some_and(|d| elapsed >= d) {
            break;
        }

        let mut timeout = host
            .sched
            .next_due()
            .map(|due| due.saturating_sub(elapsed))
            .unwrap_or(IDLE_POLL);
        if let Some(d) = duration {
            timeout = timeout.min(d.saturating_sub(elapsed));
        }

        let mut pending_resize: Option<(u16, u16)> = None;
        let mut input = false;
        if Terminal::poll_event(timeout)? {
            while Terminal::poll_event(Duration::ZERO)? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        let now = start.elapsed();
                        host.sched.advance_to(now);
                        host.handle_key(k, args.screensaver, now);
                        input = true;
                    }
                    _ => {}
                }
                if !host.running {
                    break;
                }
            }
        }
        if !host.running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            host.resize(nw, nh);
        }

        let now = start.elapsed();
        host.sched.advance_to(now);
        host.overlay
            .soundscape_mut()
            .deck_mut()
            .advance(now.saturating_sub(audio_clock));
        audio_clock = now;

        let mut drew_frame = false;
        while let Some(fired) = host.sched.pop_due() {
            match fired.kind {
                TaskKind::Timer => {
                    host.overlay.on_timer(fired.token);
                }
                TaskKind::Frame => {
                    let work_start = Instant::now();
                    let report = host
                        .overlay
                        .engine_mut()
                        .frame(fired.token, now, &mut host.sched);
                    if let Some(report) = report {
                        let drawn = host.render()?;
                        drew_frame = true;
                        if args.perf_stats {
                            let work_s = work_start.elapsed().as_secs_f32();
                            stats.record(&report, drawn, work_s, period_s);
                        }
                    }
                }
            }
        }

        // Paused: no frames arrive, but the badge still reflects key presses.
        if !drew_frame && (input || pending_resize.is_some()) {
            host.draw_hud();
            host.term.draw(&mut host.frame)?;
        }
    }

    host.overlay.shutdown(&mut host.sched);
    info!("stopped");

    if args.perf_stats {
        drop(host);
        stats.print(start.elapsed(), target_fps);
    }

    Ok(())
}
