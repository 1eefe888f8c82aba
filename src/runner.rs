use anyhow::Context;
use std::path::Path;

use crate::cli::Cli;
use findtarget::config::{self, Credentials};
use findtarget::controller::Controller;
use findtarget::http_client::FetchClient;
use findtarget::StdoutSink;

fn print_ascii_logo() {
    // stderr: stdout is reserved for targets
    eprintln!(r#"
  _____ _           _   _____                    _
 |  ___(_)_ __   __| | |_   _|_ _ _ __ __ _  ___| |_
 | |_  | | '_ \ / _` |   | |/ _` | '__/ _` |/ _ \ __|
 |  _| | | | | | (_| |   | | (_| | | | (_| |  __/ |_
 |_|   |_|_| |_|\__,_|   |_|\__,_|_|  \__, |\___|\__|
                                      |___/
                       v{}
    "#, env!("CARGO_PKG_VERSION"));
}

fn init_logging(cli: &Cli) {
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    // Our crate at the requested level, HTTP internals capped at info.
    let filter_str = format!("findtarget={crate},reqwest=info,hyper=info,h2=info", crate = crate_level);
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .init();
}

/// Load `.env` when asked to, or when one sits in the working directory.
fn load_env(forced: bool) -> anyhow::Result<()> {
    if forced || Path::new(".env").exists() {
        let path = dotenvy::dotenv().context(".env file not found or could not be loaded")?;
        tracing::debug!(path = %path.display(), "loaded environment file");
    }
    Ok(())
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(&cli);

    if !cli.silent {
        print_ascii_logo();
    }

    load_env(cli.env)?;

    let cfg = config::load_template(&cli.template).context("Error loading template")?;
    if cfg.findtarget.bugcrowd.is_none() && cfg.findtarget.hackerone.is_none() {
        tracing::warn!(template = %cli.template.display(), "no platform configured, nothing to do");
        return Ok(());
    }

    // Credentials and proxy are checked before the first request.
    let creds = match &cfg.findtarget.hackerone {
        Some(h1) => Some(Credentials::from_env(h1)?),
        None => None,
    };
    let client = FetchClient::from_config(&cfg)?;

    tracing::info!(proxy = cfg.proxy().unwrap_or("none"), timeout = ?cfg.timeout(), "Starting scan");

    let controller = Controller::new(&cfg, &client, creds);
    let mut sink = StdoutSink::default();

    tokio::select! {
        reports = controller.run(&mut sink) => {
            let failed: Vec<_> = reports
                .iter()
                .filter(|r| r.result.as_ref().is_err_and(|e| !e.is_closed_output()))
                .map(|r| r.platform)
                .collect();
            if !failed.is_empty() {
                anyhow::bail!("scan failed for: {}", failed.join(", "));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, stopping scan");
        }
    }
    Ok(())
}
