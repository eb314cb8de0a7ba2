use std::env;
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use catalog::{Configuration, LayersDocument};
use settings::Settings;
use transport::{Anonymous, LayersApi, StaticToken, TokenSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "compact" => cmd_compact(args),
        "fetch" => cmd_fetch(args),
        "history" => cmd_history(args),
        "restore" => cmd_restore(args),
        _ => Err(usage()),
    }
}

fn cmd_compact(args: Vec<String>) -> Result<(), String> {
    // geoportal compact <in.json> [out.json] [--settings settings.json]
    let (settings_path, paths) = split_args(args)?;
    if paths.is_empty() || paths.len() > 2 {
        return Err(usage());
    }

    let settings = load_settings(&settings_path)?;
    let raw = fs::read_to_string(&paths[0]).map_err(|e| format!("read {:?}: {e}", paths[0]))?;
    let doc = LayersDocument::from_json_str(&raw).map_err(|e| format!("parse {:?}: {e}", paths[0]))?;
    let config = Configuration::from_document(&doc, &settings).map_err(|e| e.to_string())?;
    info!(
        "kept {} layers and {} contexts",
        config.layers.len(),
        config.contexts.len()
    );

    let rank = config.layers.ids();
    let out = catalog::serialize(&config, &rank).map_err(|e| e.to_string())?;
    match paths.get(1) {
        Some(path) => fs::write(path, &out).map_err(|e| format!("write {path:?}: {e}"))?,
        None => println!("{out}"),
    }
    Ok(())
}

fn cmd_fetch(args: Vec<String>) -> Result<(), String> {
    let (settings_path, paths) = split_args(args)?;
    if !paths.is_empty() {
        return Err(usage());
    }

    let settings = load_settings(&settings_path)?;
    let api = api_from(&settings);
    let doc = block_on(api.fetch_document())?.map_err(|e| e.to_string())?;
    let config = Configuration::from_document(&doc, &settings).map_err(|e| e.to_string())?;
    info!(
        "document carries {} layers and {} contexts after pruning",
        config.layers.len(),
        config.contexts.len()
    );
    let pretty = serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?;
    println!("{pretty}");
    Ok(())
}

fn cmd_history(args: Vec<String>) -> Result<(), String> {
    let (settings_path, paths) = split_args(args)?;
    if !paths.is_empty() {
        return Err(usage());
    }

    let settings = load_settings(&settings_path)?;
    let api = api_from(&settings);
    let versions = block_on(api.fetch_history())?.map_err(|e| e.to_string())?;
    if versions.is_empty() {
        println!("no saved versions");
        return Ok(());
    }
    for v in versions {
        let date = v.date.unwrap_or_default();
        let user = v.user.unwrap_or_default();
        println!("{}\t{date}\t{user}", v.version);
    }
    Ok(())
}

fn cmd_restore(args: Vec<String>) -> Result<(), String> {
    let (settings_path, paths) = split_args(args)?;
    let [version] = paths.as_slice() else {
        return Err(usage());
    };

    let settings = load_settings(&settings_path)?;
    let api = api_from(&settings);
    let version = version.to_string_lossy();
    block_on(api.restore_version(&version))?.map_err(|e| e.to_string())?;
    println!("restored version {version}");
    Ok(())
}

/// Pull the `--settings` flag out of an argument list; everything else is a
/// positional path.
fn split_args(args: Vec<String>) -> Result<(PathBuf, Vec<PathBuf>), String> {
    let mut settings_path = PathBuf::from(
        env::var("GEOPORTAL_SETTINGS").unwrap_or_else(|_| "settings.json".to_string()),
    );
    let mut paths: Vec<PathBuf> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" => {
                i += 1;
                let value = args.get(i).ok_or("--settings requires a value")?;
                settings_path = PathBuf::from(value);
            }
            s if s.starts_with('-') => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
            _ => paths.push(PathBuf::from(&args[i])),
        }
        i += 1;
    }

    Ok((settings_path, paths))
}

fn load_settings(path: &PathBuf) -> Result<Settings, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    Settings::from_json_str(&raw).map_err(|e| e.to_string())
}

fn api_from(settings: &Settings) -> LayersApi {
    let token: Arc<dyn TokenSource> = match env::var("GEOPORTAL_TOKEN") {
        Ok(token) if !token.is_empty() => Arc::new(StaticToken(token)),
        _ => Arc::new(Anonymous),
    };
    LayersApi::new(settings.layers_config_api.clone(), token)
}

fn block_on<T>(fut: impl Future<Output = T>) -> Result<T, String> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("tokio runtime: {e}"))?;
    Ok(rt.block_on(fut))
}

fn usage() -> String {
    "\
usage: geoportal <command> [args]

  compact <in.json> [out.json] [--settings settings.json]
      rebuild a configuration document offline, pruning unreachable entries
  fetch [--settings settings.json]
      download the current configuration document and print it
  history [--settings settings.json]
      list saved configuration versions (requires GEOPORTAL_TOKEN)
  restore <version> [--settings settings.json]
      restore a saved configuration version (requires GEOPORTAL_TOKEN)
"
    .to_string()
}
