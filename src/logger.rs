use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;
use std::path::Path;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "scheduler.log";

/// Per-round scheduling decisions are logged at `debug` and `trace`.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Reads the level from `RUST_LOG` (`error` .. `trace`), falling back to `info`.
pub fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG").ok().and_then(|level| level.parse::<LevelFilter>().ok()).unwrap_or(DEFAULT_LEVEL)
}

/// Initializes the global logger with the level taken from `RUST_LOG`.
///
/// Call once at the start of `main`. Example:
/// `RUST_LOG=debug cargo run -- --config data/voip_scenario.json`
pub fn init() {
    init_with_level(level_from_env());
}

/// Initializes the global logger: colored lines on stderr and plain lines in `logs/scheduler.log`.
///
/// The file sink is optional. If the log directory cannot be created the logger still
/// writes to the console.
pub fn init_with_level(level: LevelFilter) {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("[{} {} {}] {}", timestamp(), colors.color(record.level()), record.target(), message))
        })
        .chain(std::io::stderr());

    let mut dispatch = Dispatch::new().level(level).level_for("serde", LevelFilter::Warn).chain(console);

    let log_file_path = Path::new(LOG_DIR).join(LOG_FILE);
    let file_sink = fs::create_dir_all(LOG_DIR).and_then(|_| fern::log_file(&log_file_path));

    let file_enabled = match file_sink {
        Ok(file) => {
            dispatch = dispatch.chain(
                Dispatch::new()
                    .format(|out, message, record| out.finish(format_args!("[{} {} {}] {}", timestamp(), record.level(), record.target(), message)))
                    .chain(file),
            );
            true
        }
        Err(e) => {
            eprintln!("Logging to console only, '{}' is not writable: {}", log_file_path.display(), e);
            false
        }
    };

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    if file_enabled {
        log::info!("Logger initialized at level {}, writing to console and '{}'.", level, log_file_path.display());
    } else {
        log::info!("Logger initialized at level {}, console only.", level);
    }
}
