// Copyright (c) 2026 rezky_nightky

use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::sky::{classify, SkyMode};

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  skyfx --weather \"\" --fps 60 --scale 1 --duration 0";

/// Conditions reachable from the number keys, in key order.
pub const PRESETS: [&str; 5] = [
    "clear sky",
    "scattered clouds",
    "overcast clouds",
    "moderate rain",
    "light snow",
];

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        let styled = if is_heading {
            format!("\x1b[1;36m{}\x1b[0m", line)
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            format!("      \x1b[32mExample:\x1b[0m{}", rest)
        } else if let Some(rest) = line.strip_prefix("  skyfx") {
            format!("  \x1b[1;34mskyfx\x1b[0m{}", rest)
        } else if line.starts_with("  -") {
            format!("\x1b[33m{}\x1b[0m", line)
        } else {
            line.to_string()
        };
        out.push_str(&styled);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "skyfx", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'w',
        long = "weather",
        default_value = "",
        help_heading = "WEATHER",
        help = "Weather condition text, e.g. \"light snow\" (empty = clear)"
    )]
    pub weather: String,

    #[arg(
        long = "sound",
        help_heading = "WEATHER",
        help = "Start unmuted (playback waits for the first keypress)"
    )]
    pub sound: bool,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Random seed for reproducible particle layouts"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write diagnostics to this file (filter with RUST_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "no-hud",
        help_heading = "APPEARANCE",
        help = "Hide the status badge"
    )]
    pub no_hud: bool,

    #[arg(
        long = "no-vignette",
        help_heading = "APPEARANCE",
        help = "Disable edge darkening"
    )]
    pub no_vignette: bool,

    #[arg(
        long = "no-grain",
        help_heading = "APPEARANCE",
        help = "Disable the film grain over the backdrop"
    )]
    pub no_grain: bool,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit"
    )]
    pub colormode: Option<u16>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "scale",
        default_value_t = 1.0,
        help_heading = "PERFORMANCE",
        help = "Device pixel ratio of the effects viewport (min 0.25 max 4)"
    )]
    pub scale: f32,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print performance statistics summary on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "list-modes",
        help_heading = "HELP",
        help = "List sky modes with sample conditions and exit"
    )]
    pub list_modes: bool,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

pub fn require_range<T>(name: &str, v: T, min: T, max: T) -> T
where
    T: PartialOrd + Display + Copy,
{
    if let Err(msg) = check_range(name, v, min, max) {
        eprintln!("{}", msg);
        std::process::exit(1);
    }
    v
}

fn check_range<T>(name: &str, v: T, min: T, max: T) -> Result<T, String>
where
    T: PartialOrd + Display + Copy,
{
    // NaN compares false both ways.
    if !(v >= min || v < min) {
        return Err(format!("failed to apply {} {} (must be a finite number)", name, v));
    }
    if v < min || v > max {
        return Err(format!("failed to apply {} {} (min {} max {})", name, v, min, max));
    }
    Ok(v)
}

/// Next preset after `current`, wrapping around. Unknown text starts over.
pub fn next_preset(current: &str) -> &'static str {
    let pos = PRESETS
        .iter()
        .position(|p| p.eq_ignore_ascii_case(current.trim()));
    match pos {
        Some(i) => PRESETS[(i + 1) % PRESETS.len()],
        None => PRESETS[0],
    }
}

pub fn print_list_modes() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mSKY MODES:\x1b[0m");
        println!("\x1b[2mNOTE: --weather takes free text; the first matching group wins.\x1b[0m");
    } else {
        println!("SKY MODES:");
        println!("NOTE: --weather takes free text; the first matching group wins.");
    }
    println!();
    println!("MODE     PARTICLES     AUDIO            EXAMPLES");
    let rows: [(SkyMode, &str, &str, &str); 5] = [
        (SkyMode::Snow, "snowflakes", "snow loop", "light snow, sleet, kar"),
        (SkyMode::Rain, "rain streaks", "rain loop", "moderate rain, thunderstorm, yağmur"),
        (SkyMode::Partly, "clouds", "wind loop", "scattered clouds, partly cloudy"),
        (SkyMode::Cloudy, "clouds", "wind loop", "overcast clouds, bulutlu"),
        (SkyMode::Clear, "sun glints", "birds (12s)", "clear sky, anything else"),
    ];
    for (mode, particles, audio, examples) in rows {
        println!(
            "{:<8} {:<13} {:<16} {}",
            mode.label(),
            particles,
            audio,
            examples
        );
    }
    println!();
    println!("PRESET KEYS:");
    for (i, p) in PRESETS.iter().enumerate() {
        println!("  {}  {:<18} -> {}", i + 1, p, classify(Some(p)).label());
    }
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  skyfx [OPTIONS]\n\nWEATHER:\n  -w, --weather <text>\n      Weather condition description; classified into a sky mode.\n      Example: skyfx -w \"light snow showers\"\n\n  --sound\n      Start unmuted. Audio still waits for the first keypress.\n      Example: skyfx -w rain --sound\n\nGENERAL:\n  -s, --screensaver\n      Screensaver mode (exit on keypress).\n      Example: skyfx -s\n\n  --duration <seconds>\n      Stop after N seconds (min 0.1 max 86400).\n      Example: skyfx --duration 10\n\n  --seed <number>\n      Seed the particle generator.\n      Example: skyfx --seed 7\n\n  --log-file <path>\n      Write diagnostics to a file; RUST_LOG selects the level.\n      Example: RUST_LOG=debug skyfx --log-file skyfx.log\n\nAPPEARANCE:\n  --colormode <0|16|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n      Example: skyfx --colormode 24\n\n  --no-hud\n      Hide the status badge.\n      Example: skyfx --no-hud\n\n  --no-vignette\n      Disable edge darkening.\n      Example: skyfx --no-vignette\n\n  --no-grain\n      Disable the film grain over the backdrop.\n      Example: skyfx --no-grain\n\nPERFORMANCE:\n  -f, --fps <number>\n      Target FPS (min 1 max 240).\n      Example: skyfx --fps 30\n\n  --scale <ratio>\n      Device pixel ratio; larger values mean more particles.\n      Example: skyfx --scale 2\n\n  --perf-stats\n      Print performance statistics summary on exit.\n      Example: skyfx --duration 10 --perf-stats\n\nKEYS:\n  q, Esc     quit\n  m          toggle mute\n  1-5        preset conditions\n  c          cycle presets\n  p          pause / resume\n  space      regenerate particles\n\nHELP:\n  --list-modes\n      List sky modes and exit.\n\n  --check-bitcolor\n      Print detected terminal color capability and exit.\n\n  --help\n      Show short help.\n\n  --help-detail\n      Show this detailed help.\n\n  -v, --version\n      Print version and exit.\n\n  -i, --info\n      Print version info and exit.\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }

    let tail = "\nLIMITS / VALID RANGES:\n";
    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(tail));
    } else {
        print!("{}", tail);
    }
    println!("  --duration <seconds>     min 0.1 max 86400 (<=0 disables)");
    println!("  --fps <number>           min 1 max 240");
    println!("  --scale <ratio>          min 0.25 max 4");
    println!("  --colormode <0|16|8|24>  allowed values only (8==256, 24==32)");
    println!();
    print_list_modes();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_parse() {
        let a = Args::try_parse_from(["skyfx"]).unwrap();
        assert_eq!(a.weather, "");
        assert_eq!(a.fps, 60.0);
        assert_eq!(a.scale, 1.0);
        assert!(!a.sound);
        assert!(a.log_file.is_none());
    }

    #[test]
    fn weather_flag_takes_free_text() {
        let a = Args::try_parse_from(["skyfx", "-w", "light snow showers", "--seed", "7"]).unwrap();
        assert_eq!(classify(Some(&a.weather)), SkyMode::Snow);
        assert_eq!(a.seed, Some(7));
    }

    #[test]
    fn range_messages() {
        assert_eq!(check_range("--fps", 30.0, 1.0, 240.0), Ok(30.0));
        assert_eq!(
            check_range("--fps", 500.0, 1.0, 240.0),
            Err("failed to apply --fps 500 (min 1 max 240)".to_string())
        );
        assert!(check_range("--scale", f32::NAN, 0.25, 4.0)
            .unwrap_err()
            .contains("finite"));
    }

    #[test]
    fn presets_cover_every_mode_and_cycle() {
        let modes: Vec<SkyMode> = PRESETS.iter().map(|p| classify(Some(p))).collect();
        for m in SkyMode::ALL {
            assert!(modes.contains(&m), "{:?}", m);
        }
        assert_eq!(next_preset("light snow"), "clear sky");
        assert_eq!(next_preset("Clear Sky"), "scattered clouds");
        assert_eq!(next_preset("fog"), "clear sky");
    }
}
