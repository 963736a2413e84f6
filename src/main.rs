use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use wayshare::config::{Config, ConfigError, Overrides};
use wayshare::upload::{Mode, Pipeline, PipelineOutcome, UploadDependencies, pipeline};

const USAGE: &str = "Usage: wayshare [--upload SOURCE | --clipboard] [--volume 0.0-1.0] [--length N] [--config PATH]";

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WAYSHARE_GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "wayshare")]
#[command(
    version = VERSION,
    about = "Share screenshots, files and clipboard contents via S3-compatible storage"
)]
struct Cli {
    /// Upload a file path, file:// URL or http(s) URL instead of taking a screenshot
    #[arg(long, short = 'u', value_name = "SOURCE")]
    upload: Option<String>,

    /// Upload whatever is on the clipboard (image, URL, path or text)
    #[arg(long, short = 'c')]
    clipboard: bool,

    /// Volume for the success/failure sounds (0.0 - 1.0)
    #[arg(long, value_name = "VOLUME")]
    volume: Option<f64>,

    /// Length of the random public filename
    #[arg(long, value_name = "N")]
    length: Option<usize>,

    /// Read settings from this file instead of ~/.config/wayshare/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mode = match Mode::from_flags(cli.upload, cli.clipboard) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("wayshare: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(pipeline::EXIT_USAGE);
        }
    };

    let overrides = Overrides {
        volume: cli.volume,
        filename_length: cli.length,
    };
    let config = match Config::load(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => return config_failure(&e),
    };

    match run(&config, mode) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(pipeline::EXIT_FAILURE)
        }
    }
}

fn run(config: &Config, mode: Mode) -> anyhow::Result<ExitCode> {
    let target = config.storage.target()?;
    let deps = UploadDependencies::detect(config, &target)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(Pipeline::new(config, &target, &deps).run(mode));

    match &result {
        Ok(PipelineOutcome::Published(upload)) => {
            eprintln!("{} ({})", upload.public_url, upload.formatted_size);
        }
        Ok(PipelineOutcome::Aborted(reason)) => log::info!("Nothing uploaded: {}", reason),
        // Already reported by the failure handler.
        Err(_) => {}
    }
    Ok(ExitCode::from(pipeline::exit_code(&result)))
}

fn config_failure(err: &anyhow::Error) -> ExitCode {
    eprintln!("wayshare: {err:#}");
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::ConfigurationMissing(_)) => {
            eprintln!(
                "Set the WAYSHARE_S3_* and WAYSHARE_URL_BASE variables or add a [storage] section to {}",
                Config::get_config_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            );
        }
        Some(ConfigError::InvalidConfiguration(_)) | None => {}
    }
    eprintln!("{USAGE}");
    ExitCode::from(pipeline::EXIT_USAGE)
}
