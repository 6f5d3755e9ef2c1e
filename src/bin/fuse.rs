//! Offline fusion binary.
//!
//! Reads one `FuseRequest` JSON object from stdin, runs fuse → merge →
//! truncate, and writes the `FuseResponse` JSON to stdout. An optional
//! first argument names a TOML config file; otherwise the default config
//! path is used if it exists.
//!
//! All tracing output goes to stderr so that stdout stays clean JSON.

use std::io::Read;
use std::path::PathBuf;

use bookrank::{AppConfig, FuseRequest, run_fuse_request};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let request: FuseRequest = serde_json::from_str(&input)
        .map_err(|e| anyhow::anyhow!("invalid fuse request: {e}"))?;

    let response = run_fuse_request(request, &config.retrieval).map_err(|e| {
        tracing::error!(error = %e, "fusion failed");
        anyhow::anyhow!("bookrank-fuse failed: {e}")
    })?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    if let Some(path) = explicit {
        tracing::info!(path = %path.display(), "loading config");
        return Ok(AppConfig::from_file(&path)?);
    }
    let default_path = AppConfig::default_config_path();
    if default_path.exists() {
        tracing::info!(path = %default_path.display(), "loading default config");
        Ok(AppConfig::from_file(&default_path)?)
    } else {
        Ok(AppConfig::default())
    }
}
