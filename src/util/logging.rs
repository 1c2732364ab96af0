use std::{collections::HashMap, sync::RwLock};

use super::settings::LoggingSettings;

pub(crate) static LOGGER_CONFIG: once_cell::sync::Lazy<RwLock<LoggingConfig>> =
    once_cell::sync::Lazy::new(|| RwLock::new(LoggingConfig::default()));

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub enum LogLevel {
    INFO,
    VERBOSE,
}

#[macro_export]
macro_rules! logln {
    ($fmt:literal) => {
        if $crate::util::logging::is_enabled(Self::CC) {
            ::log::info!(target: Self::CC, "[{}:{}] {}", file!(), line!(), $fmt);
        }
    };
    ($fmt:literal, $($arg:tt)*) => {
        if $crate::util::logging::is_enabled(Self::CC) {
            ::log::info!(target: Self::CC, "[{}:{}] {}", file!(), line!(), format_args!($fmt, $($arg)*));
        }
    };
}

#[macro_export]
macro_rules! logwarn {
    ($fmt:literal) => {
        if $crate::util::logging::is_enabled(Self::CC) {
            ::log::warn!(target: Self::CC, "[{}:{}] {}", file!(), line!(), $fmt);
        }
    };
    ($fmt:literal, $($arg:tt)*) => {
        if $crate::util::logging::is_enabled(Self::CC) {
            ::log::warn!(target: Self::CC, "[{}:{}] {}", file!(), line!(), format_args!($fmt, $($arg)*));
        }
    };
}

#[macro_export]
macro_rules! logvbln {
    ($fmt:literal) => {
        if $crate::util::logging::is_enabled(Self::CC) && $crate::util::logging::is_at_level(Self::CC, $crate::util::logging::LogLevel::VERBOSE) {
            ::log::debug!(target: Self::CC, "[{}:{}] {}", file!(), line!(), $fmt);
        }
    };
    ($fmt:literal, $($arg:tt)*) => {
        if $crate::util::logging::is_enabled(Self::CC) && $crate::util::logging::is_at_level(Self::CC, $crate::util::logging::LogLevel::VERBOSE) {
            ::log::debug!(target: Self::CC, "[{}:{}] {}", file!(), line!(), format_args!($fmt, $($arg)*));
        }
    };
}

pub fn is_enabled(cc: &str) -> bool {
    LOGGER_CONFIG
        .read()
        .map(|config| config.cc_enabled(cc))
        .unwrap_or(false)
}

pub fn is_at_level(cc: &str, level: LogLevel) -> bool {
    LOGGER_CONFIG
        .read()
        .map(|config| config.cc_at_level(cc, level))
        .unwrap_or(false)
}

/// Loads the `[logging]` section into the component flags.
pub fn configure(settings: &LoggingSettings) {
    if let Ok(mut config) = LOGGER_CONFIG.write() {
        config.apply(settings);
    }
}

/// Maps the textual level of the settings file onto a `log` filter.
pub fn level_filter(level: &str) -> log::LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// Installs the global dispatcher: stderr, plus the configured file.
pub fn setup_logging(settings: &LoggingSettings) -> Result<(), fern::InitError> {
    configure(settings);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_filter(&settings.level));

    // verbose components get their debug lines through whatever the global level is
    for cc in &settings.verbose {
        dispatch = dispatch.level_for(cc.clone(), log::LevelFilter::Debug);
    }

    dispatch = dispatch.chain(std::io::stderr());

    if let Some(path) = &settings.file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;

    Ok(())
}

pub struct LoggingConfig {
    global_tracing_enabled: bool,
    global_level: LogLevel,
    flags: HashMap<String, (bool, LogLevel)>, // <component code, (tracing enabled, trace level)>
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_tracing_enabled: true,
            global_level: LogLevel::INFO,
            flags: Default::default(),
        }
    }
}

impl LoggingConfig {
    pub fn cc_enabled(&self, cc: &str) -> bool {
        if !self.global_tracing_enabled {
            return false;
        }

        self.flags.get(cc).unwrap_or(&(true, LogLevel::INFO)).0
    }

    pub fn cc_at_level(&self, cc: &str, level: LogLevel) -> bool {
        if self.global_level >= level {
            return true;
        }

        self.flags.get(cc).unwrap_or(&(true, LogLevel::INFO)).1 >= level
    }

    pub fn enable_cc(&mut self, cc: &str, level: LogLevel) {
        self.flags.insert(cc.to_string(), (true, level));
    }

    pub fn disable_cc(&mut self, cc: &str) {
        self.flags.insert(cc.to_string(), (false, LogLevel::INFO));
    }

    pub fn enable_global_tracing(&mut self) {
        self.global_tracing_enabled = true;
    }

    pub fn disable_global_tracing(&mut self) {
        self.global_tracing_enabled = false;
    }

    pub fn set_global_level(&mut self, level: LogLevel) {
        self.global_level = level;
    }

    /// `off` silences every component; `quiet` wins over `verbose`.
    pub fn apply(&mut self, settings: &LoggingSettings) {
        let filter = level_filter(&settings.level);

        if filter == log::LevelFilter::Off {
            self.disable_global_tracing();
        } else {
            self.enable_global_tracing();
        }

        if filter >= log::LevelFilter::Debug {
            self.set_global_level(LogLevel::VERBOSE);
        } else {
            self.set_global_level(LogLevel::INFO);
        }

        for cc in &settings.verbose {
            self.enable_cc(cc, LogLevel::VERBOSE);
        }
        for cc in &settings.quiet {
            self.disable_cc(cc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_flags_override_defaults() {
        let mut config = LoggingConfig::default();
        assert!(config.cc_enabled("Collection"));
        assert!(!config.cc_at_level("Collection", LogLevel::VERBOSE));

        config.enable_cc("Collection", LogLevel::VERBOSE);
        assert!(config.cc_at_level("Collection", LogLevel::VERBOSE));

        config.disable_cc("Drawing");
        assert!(!config.cc_enabled("Drawing"));

        config.disable_global_tracing();
        assert!(!config.cc_enabled("Collection"));
    }

    #[test]
    fn global_verbose_covers_every_component() {
        let mut config = LoggingConfig::default();
        config.set_global_level(LogLevel::VERBOSE);

        assert!(config.cc_at_level("Anything", LogLevel::VERBOSE));
    }

    #[test]
    fn settings_drive_component_flags() {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            verbose: vec!["Collection".to_string(), "Drawing".to_string()],
            quiet: vec!["Drawing".to_string()],
            ..LoggingSettings::default()
        };

        let mut config = LoggingConfig::default();
        config.apply(&settings);

        assert!(config.cc_enabled("Collection"));
        assert!(config.cc_at_level("Collection", LogLevel::VERBOSE));
        assert!(!config.cc_enabled("Drawing"));
        assert!(config.cc_enabled("App"));
        assert!(!config.cc_at_level("App", LogLevel::VERBOSE));
    }

    #[test]
    fn off_silences_everything() {
        let settings = LoggingSettings {
            level: "off".to_string(),
            verbose: vec!["Collection".to_string()],
            ..LoggingSettings::default()
        };

        let mut config = LoggingConfig::default();
        config.apply(&settings);
        assert!(!config.cc_enabled("Collection"));

        config.apply(&LoggingSettings {
            level: "debug".to_string(),
            ..LoggingSettings::default()
        });
        assert!(config.cc_enabled("App"));
        assert!(config.cc_at_level("App", LogLevel::VERBOSE));
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(level_filter("WARN"), log::LevelFilter::Warn);
        assert_eq!(level_filter("nonsense"), log::LevelFilter::Info);
    }
}
