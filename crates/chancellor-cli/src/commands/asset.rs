//! Asset store commands

use anyhow::{bail, Result};
use chancellor_asset::global;
use chancellor_asset::{
    AssetStore, ChancellorConfig, HeadlessBackend, LoadReport, NativeBackend, Resource, ResourceKind,
};
use chancellor_core::ChancellorError;
use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum AssetCommands {
    /// Load an asset tree and list what it contains
    List {
        /// Asset root (defaults to the configured root)
        root: Option<PathBuf>,

        /// Only show one kind (image, audio, shader, json, xml, text, raw)
        #[arg(long)]
        kind: Option<ResourceKind>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show a single loaded asset
    Info {
        /// Relative asset path, e.g. sprites/player/idle.png
        path: String,

        /// Asset root (defaults to the configured root)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Load an asset tree and fail if any file degraded to a raw file
    Check {
        /// Asset root (defaults to the configured root)
        root: Option<PathBuf>,
    },
}

pub fn run(cmd: AssetCommands, config: &ChancellorConfig) -> Result<()> {
    match cmd {
        AssetCommands::List { root, kind, format } => {
            let root = root.unwrap_or_else(|| config.assets.root.clone());
            run_list(&root, kind, &format, config)
        }
        AssetCommands::Info { path, root } => {
            let root = root.unwrap_or_else(|| config.assets.root.clone());
            run_info(&root, &path, config)
        }
        AssetCommands::Check { root } => {
            let root = root.unwrap_or_else(|| config.assets.root.clone());
            run_check(&root, config)
        }
    }
}

#[derive(Debug, Serialize)]
struct AssetRow {
    path: String,
    kind: ResourceKind,
    detail: String,
}

/// Install a headless store as the process-wide store and load `root` into it
fn open_store(root: &Path, config: &ChancellorConfig) -> Result<LoadReport> {
    let backend: Box<dyn NativeBackend> = Box::new(HeadlessBackend::new());
    global::install(AssetStore::from_settings(backend, &config.assets));

    let loaded = global::with_store_mut(|store| store.load_assets(root));
    match loaded {
        Some(Ok(report)) => {
            log::debug!(
                "Loaded {} file(s) from {} ({} degraded)",
                report.files,
                report.root.display(),
                report.degraded.len()
            );
            Ok(report)
        }
        Some(Err(ChancellorError::RootNotFound(path))) => {
            global::shutdown();
            bail!(
                "Asset root '{}' does not exist or is not a directory",
                path.display()
            )
        }
        Some(Err(e)) => {
            global::shutdown();
            Err(e.into())
        }
        None => bail!("Asset store is not installed"),
    }
}

fn run_list(
    root: &Path,
    kind: Option<ResourceKind>,
    format: &str,
    config: &ChancellorConfig,
) -> Result<()> {
    if format != "text" && format != "json" {
        bail!("Unknown format '{}' (expected text or json)", format);
    }

    let report = open_store(root, config)?;
    let rows = global::with_store(|store| {
        let mut rows: Vec<AssetRow> = store
            .all()
            .iter()
            .filter(|(_, resource)| kind.map_or(true, |k| resource.kind() == k))
            .map(|(path, resource)| AssetRow {
                path: path.clone(),
                kind: resource.kind(),
                detail: describe(resource),
            })
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    })
    .unwrap_or_default();
    global::shutdown();

    if format == "json" {
        let output = serde_json::json!({
            "root": report.root,
            "assets": rows,
            "degraded": report.degraded,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No assets found in {}", root.display());
        return Ok(());
    }

    println!("{} asset(s) in {}:\n", rows.len(), root.display());
    for row in &rows {
        println!("  {:<40} {:<7} {}", row.path, row.kind, row.detail);
    }

    if !report.degraded.is_empty() {
        println!("\n{} file(s) loaded as raw after a decode failure", report.degraded.len());
    }

    Ok(())
}

fn run_info(root: &Path, path: &str, config: &ChancellorConfig) -> Result<()> {
    open_store(root, config)?;

    let lines = global::with_store(|store| store.get(path).map(info_lines)).flatten();
    global::shutdown();

    match lines {
        Some(lines) => {
            println!("Asset: {}", path);
            for line in lines {
                println!("  {}", line);
            }
        }
        None => bail!("Asset '{}' not found under {}", path, root.display()),
    }

    Ok(())
}

fn run_check(root: &Path, config: &ChancellorConfig) -> Result<()> {
    let report = open_store(root, config)?;
    global::shutdown();

    println!("Checked {} file(s) in {}", report.files, root.display());
    for kind in ResourceKind::ALL {
        let count = report.count(kind);
        if count > 0 {
            println!("  {:<7} {}", kind, count);
        }
    }

    if report.is_clean() {
        println!("\nAll assets decoded.");
        return Ok(());
    }

    println!("\n{} file(s) failed to decode:", report.degraded.len());
    for degraded in &report.degraded {
        println!("  [fail] {}: {}", degraded.path, degraded.reason);
    }
    std::process::exit(1);
}

/// One-line summary of a loaded resource
fn describe(resource: &Resource) -> String {
    match resource {
        Resource::Image(image) => format!("{}x{}", image.width(), image.height()),
        Resource::Audio(audio) => format!(
            "{} Hz, {:.2}s",
            audio.sample_rate(),
            audio.duration().as_secs_f64()
        ),
        Resource::Shader(shader) => format!("{} stage", shader.stage()),
        Resource::Json(value) => match value {
            serde_json::Value::Object(map) => format!("object, {} key(s)", map.len()),
            serde_json::Value::Array(items) => format!("array, {} item(s)", items.len()),
            _ => "scalar".to_string(),
        },
        Resource::Xml(element) => {
            format!("<{}>, {} child element(s)", element.name, element.children.len())
        }
        Resource::Text(text) => format!("{} byte(s)", text.len()),
        Resource::Raw(raw) => raw.path().display().to_string(),
    }
}

fn info_lines(resource: &Resource) -> Vec<String> {
    let mut lines = vec![format!("Kind: {}", resource.kind())];
    match resource {
        Resource::Image(image) => {
            lines.push(format!("Size: {}x{}", image.width(), image.height()));
            lines.push(format!("Handle: #{}", image.native().id()));
        }
        Resource::Audio(audio) => {
            lines.push(format!("Sample rate: {} Hz", audio.sample_rate()));
            lines.push(format!("Frames: {}", audio.frames()));
            lines.push(format!("Duration: {:.3}s", audio.duration().as_secs_f64()));
            lines.push(format!("Handle: #{}", audio.native().id()));
        }
        Resource::Shader(shader) => {
            lines.push(format!("Stage: {}", shader.stage()));
            lines.push(format!("Handle: #{}", shader.native().id()));
        }
        Resource::Json(value) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            lines.push("Value:".to_string());
            lines.extend(pretty.lines().map(|l| format!("  {}", l)));
        }
        Resource::Xml(element) => {
            lines.push(format!("Root element: <{}>", element.name));
            for (key, value) in &element.attributes {
                lines.push(format!("  @{} = {}", key, value));
            }
            lines.push(format!("Children: {}", element.children.len()));
        }
        Resource::Text(text) => {
            lines.push(format!("Length: {} byte(s)", text.len()));
            lines.push(format!("Lines: {}", text.lines().count()));
        }
        Resource::Raw(raw) => {
            lines.push(format!("Location: {}", raw.path().display()));
        }
    }
    lines
}
