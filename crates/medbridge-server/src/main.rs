use std::env;
use std::process::ExitCode;

use medbridge_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use medbridge_server::{ServerBuilder, apply_logging_level, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => eprintln!("ignoring unreadable .env: {e}"),
    }

    init_tracing();

    let (config_path, origin) = config_path(env::args().skip(1));
    let cfg = match load_config(Some(&config_path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(2);
        }
    };
    apply_logging_level(&cfg.logging.level);
    tracing::info!(path = %config_path, origin, role = %cfg.role, "configuration loaded");

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            return ExitCode::from(2);
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

/// `--config <path>`, then `MEDBRIDGE_CONFIG`, then `medbridge.toml`.
fn config_path(mut args: impl Iterator<Item = String>) -> (String, &'static str) {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, "--config");
            }
        }
    }
    match env::var("MEDBRIDGE_CONFIG") {
        Ok(path) if !path.is_empty() => (path, "MEDBRIDGE_CONFIG"),
        _ => (DEFAULT_CONFIG_FILE.to_string(), "default"),
    }
}
