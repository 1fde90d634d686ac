use clap::{Parser, Subcommand};
use slog::{o, Drain, Level, Logger};
use std::{env, time::Duration};
use tempo_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_AEMET_BASE_URL, DEFAULT_REPORT_TIME,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_TIMEZONE,
};

use crate::{DatasetConfig, Language, RenderOptions, Subscription};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "tempo - AEMET forecast reports for Galician places"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $TEMPO_CONFIG, ./tempo.toml,
    /// $XDG_CONFIG_HOME/tempo/tempo.toml, /etc/tempo/tempo.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "TEMPO_LEVEL")]
    pub level: Option<String>,

    /// Base URL serving the AEMET municipality feeds
    #[arg(short, long, env = "TEMPO_BASE_URL")]
    pub base_url: Option<String>,

    /// Language for sky descriptions: gal, es
    #[arg(long, env = "TEMPO_LANGUAGE")]
    pub language: Option<Language>,

    /// IANA timezone the report time is read in
    #[arg(long, env = "TEMPO_TIMEZONE")]
    pub timezone: Option<String>,

    /// Local time (HH:MM) daily reports are sent
    #[arg(long, env = "TEMPO_REPORT_TIME")]
    pub report_time: Option<String>,

    /// URL reports are posted to; without it they are printed
    #[arg(long, env = "TEMPO_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Seconds before an HTTP request is abandoned
    #[arg(long, env = "TEMPO_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Fail daily reports missing a morning/afternoon/night period
    #[arg(long, env = "TEMPO_STRICT_PERIODS")]
    pub strict_periods: Option<bool>,

    /// Reference datasets, config file only
    #[arg(skip)]
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,

    /// Daily report subscriptions, config file only
    #[arg(skip)]
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,

    #[command(subcommand)]
    #[serde(skip)]
    pub command: Option<Command>,

    /// Where the config file was found
    #[arg(skip)]
    #[serde(skip)]
    pub source: Option<ConfigSource>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Hourly report for today, from the current hour
    Today {
        #[arg(required = true, num_args = 1..)]
        place: Vec<String>,
    },
    /// Daily report for tomorrow
    Tomorrow {
        #[arg(required = true, num_args = 1..)]
        place: Vec<String>,
    },
    /// Send the configured daily reports every day (default)
    Serve,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AEMET_BASE_URL.to_string())
    }

    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn timezone(&self) -> String {
        self.timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
    }

    pub fn report_time(&self) -> String {
        self.report_time
            .clone()
            .unwrap_or_else(|| DEFAULT_REPORT_TIME.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
    }

    pub fn strict_periods(&self) -> bool {
        self.strict_periods.unwrap_or(true)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            language: self.language(),
            strict_periods: self.strict_periods(),
        }
    }

    pub fn config_source(&self) -> ConfigSource {
        self.source.clone().unwrap_or(ConfigSource::Defaults)
    }

    /// Configured datasets, or the bundled Galician concellos table.
    pub fn datasets(&self) -> Vec<DatasetConfig> {
        if !self.datasets.is_empty() {
            return self.datasets.clone();
        }
        vec![DatasetConfig {
            name: String::from("concellos"),
            path: String::from("data/concellos_galicia.csv"),
            code_columns: vec![0],
            name_column: 1,
            threshold: 0.8,
            delimiter: ';',
            has_headers: false,
            case_sensitive: true,
        }]
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    // Determine config file path
    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("TEMPO_CONFIG", "tempo.toml")
    };

    // Load from config file; the logger is not up yet
    let file_config: Cli = load_config(&source).unwrap_or_else(|err| {
        eprintln!("ignoring config file {}: {:#}", source, err);
        Cli::default()
    });

    merge_config(cli_args, file_config, source)
}

/// CLI args override file config (env vars are handled by clap)
pub fn merge_config(cli_args: Cli, file_config: Cli, source: ConfigSource) -> Cli {
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        base_url: cli_args.base_url.or(file_config.base_url),
        language: cli_args.language.or(file_config.language),
        timezone: cli_args.timezone.or(file_config.timezone),
        report_time: cli_args.report_time.or(file_config.report_time),
        webhook_url: cli_args.webhook_url.or(file_config.webhook_url),
        request_timeout: cli_args.request_timeout.or(file_config.request_timeout),
        strict_periods: cli_args.strict_periods.or(file_config.strict_periods),
        datasets: file_config.datasets,
        subscriptions: file_config.subscriptions,
        command: cli_args.command,
        source: Some(source),
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let level = cli
        .level
        .clone()
        .unwrap_or_else(|| env::var("RUST_LOG").unwrap_or_default());
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"
level = "debug"
language = "es"
timezone = "Atlantic/Canary"
report_time = "07:30"
strict_periods = false

[[datasets]]
name = "galicia"
path = "data/concellos_galicia.csv"
threshold = 0.8

[[datasets]]
name = "spain"
path = "/var/lib/tempo/municipios.csv"
code_columns = [0, 1]
name_column = 2
has_headers = true
threshold = 0.9

[[subscriptions]]
place = "Vigo"
"#;

    #[test]
    fn file_config_parses() {
        let file: Cli = toml::from_str(FILE).unwrap();
        assert_eq!(file.language(), Language::Es);
        assert_eq!(file.timezone(), "Atlantic/Canary");
        assert_eq!(file.report_time(), "07:30");
        assert!(!file.strict_periods());
        assert_eq!(file.datasets.len(), 2);
        assert_eq!(file.datasets[1].code_columns, vec![0, 1]);
        assert_eq!(file.subscriptions.len(), 1);
    }

    #[test]
    fn file_accepts_every_cli_language_spelling() {
        for spelling in ["gal", "gl"] {
            let file: Cli = toml::from_str(&format!(
                "language = \"{}\"\n[[datasets]]\nname = \"galicia\"\npath = \"x.csv\"\nthreshold = 0.8\n",
                spelling
            ))
            .unwrap();
            assert_eq!(file.language(), Language::Gal);
            assert_eq!(spelling.parse::<Language>(), Ok(Language::Gal));
            assert_eq!(file.datasets.len(), 1);
        }
    }

    #[test]
    fn cli_overrides_file() {
        let file: Cli = toml::from_str(FILE).unwrap();
        let args = Cli {
            level: Some(String::from("warn")),
            report_time: Some(String::from("09:00")),
            command: Some(Command::Serve),
            ..Cli::default()
        };
        let merged = merge_config(args, file, ConfigSource::Defaults);
        assert_eq!(merged.level.as_deref(), Some("warn"));
        assert_eq!(merged.report_time(), "09:00");
        assert_eq!(merged.timezone(), "Atlantic/Canary");
        assert_eq!(merged.datasets.len(), 2);
        assert_eq!(merged.command, Some(Command::Serve));
    }

    #[test]
    fn defaults_apply_without_config() {
        let cli = Cli::default();
        assert_eq!(cli.base_url(), "https://www.aemet.es");
        assert_eq!(cli.language(), Language::Gal);
        assert_eq!(cli.timezone(), "Europe/Madrid");
        assert_eq!(cli.report_time(), "08:00");
        assert_eq!(cli.request_timeout(), Duration::from_secs(20));
        assert!(cli.strict_periods());
        assert_eq!(cli.datasets().len(), 1);
        assert_eq!(cli.config_source(), ConfigSource::Defaults);
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["tempo", "today", "Santiago", "de", "Compostela"]);
        assert_eq!(
            cli.command,
            Some(Command::Today {
                place: vec![
                    String::from("Santiago"),
                    String::from("de"),
                    String::from("Compostela")
                ]
            })
        );
        let cli = Cli::parse_from(["tempo", "--language", "es", "tomorrow", "Vigo"]);
        assert_eq!(cli.language, Some(Language::Es));
        assert!(Cli::try_parse_from(["tempo", "today"]).is_err());
    }
}
