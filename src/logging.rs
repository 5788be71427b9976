use crate::config::LoggingConfig;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::path::Path;

/// Install the global logger described by `config`.
/// Best-effort: a bad level or an unwritable log file leaves logging off
/// with a note on stderr.
pub fn init(config: &LoggingConfig, force_debug: bool) {
    let level = if force_debug {
        LevelFilter::Debug
    } else {
        parse_level(&config.level).unwrap_or_else(|| {
            eprintln!("pipesh: unknown log level '{}', logging disabled", config.level);
            LevelFilter::Off
        })
    };
    if level == LevelFilter::Off {
        return;
    }

    let log_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let file = shellexpand::tilde(&config.file);
    let result = if file.is_empty() {
        TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto)
    } else {
        let path = Path::new(file.as_ref());
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        else {
            eprintln!("pipesh: cannot open log file {}", path.display());
            return;
        };
        WriteLogger::init(level, log_config, file)
    };

    if let Err(e) = result {
        eprintln!("pipesh: logging not started: {e}");
    }
}

/// Map a config level name onto a filter. Case-insensitive.
fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_lowercase().as_str() {
        "off" | "" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
