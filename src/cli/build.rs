//! Build command implementation.
//!
//! Loads the task options, runs the sprite pipeline once, and optionally
//! keeps watching the source directories to rebuild on change.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use clap::Args;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::bridge::ProcessCompositor;
use crate::collect::is_image;
use crate::config::{Manifest, Margin, SpriteTask, MANIFEST_FILENAME};
use crate::error::{Result, SpriteError};
use crate::output::{display_path, Printer};
use crate::pipeline::generate;
use crate::stylesheet::Dialect;

/// Quiet period before a rebuild, so one save triggers one build.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Generate the sprite map and stylesheet
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Task manifest (default: ./sprites.yaml when present)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Source image glob pattern; repeatable, `!` prefix excludes
    #[arg(long = "src", value_name = "PATTERN")]
    pub src: Vec<String>,

    /// Stylesheet output path
    #[arg(long)]
    pub css: Option<PathBuf>,

    /// Sprite map output path
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// Pixel margin between images (non-numeric counts as 0)
    #[arg(long)]
    pub margin: Option<Margin>,

    /// Prefix for generated class names
    #[arg(long)]
    pub class_prefix: Option<String>,

    /// Stylesheet dialect
    #[arg(long, value_enum)]
    pub output: Option<Dialect>,

    /// Renderer binary
    #[arg(long)]
    pub renderer: Option<PathBuf>,

    /// Compositing script passed to the renderer
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Renderer timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Rebuild whenever a source image changes
    #[arg(long)]
    pub watch: bool,
}

pub async fn run(args: BuildArgs, printer: &Printer) -> Result<()> {
    let task = load_task(&args)?;
    let compositor = ProcessCompositor::new(task.process_config());

    let first = generate(&task, &compositor, printer).await;
    if !args.watch {
        return first.map(|_| ());
    }
    if let Err(e) = first {
        printer.error("Failed", &e.to_string());
    }

    watch(&task, &compositor, printer).await
}

/// Read the manifest (if any) and layer the CLI flags on top.
pub fn load_task(args: &BuildArgs) -> Result<SpriteTask> {
    let manifest = match &args.config {
        Some(path) => Manifest::load(path)?,
        None => {
            let default = Path::new(MANIFEST_FILENAME);
            if default.exists() {
                Manifest::load(default)?
            } else {
                Manifest::default()
            }
        }
    };

    apply_overrides(manifest, args).into_task()
}

fn apply_overrides(mut manifest: Manifest, args: &BuildArgs) -> Manifest {
    if !args.src.is_empty() {
        manifest.src = args.src.clone();
    }
    if let Some(css) = &args.css {
        manifest.css = Some(css.clone());
    }
    if let Some(map) = &args.map {
        manifest.map = Some(map.clone());
    }
    if let Some(margin) = args.margin {
        manifest.margin = margin;
    }
    if let Some(prefix) = &args.class_prefix {
        manifest.class_prefix = prefix.clone();
    }
    if let Some(output) = args.output {
        manifest.output = output;
    }
    if let Some(renderer) = &args.renderer {
        manifest.renderer.path = Some(renderer.clone());
    }
    if let Some(script) = &args.script {
        manifest.renderer.script = Some(script.clone());
    }
    if let Some(timeout) = args.timeout {
        manifest.renderer.timeout_secs = timeout;
    }
    manifest
}

async fn watch(task: &SpriteTask, compositor: &ProcessCompositor, printer: &Printer) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })
    .map_err(|e| SpriteError::Io {
        path: PathBuf::from("."),
        message: format!("Failed to start file watcher: {}", e),
    })?;

    for root in watch_roots(&task.src) {
        if !root.exists() {
            printer.warning("Skipping", &format!("{} (does not exist)", display_path(&root)));
            continue;
        }
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| SpriteError::Io {
                path: root.clone(),
                message: format!("Failed to watch directory: {}", e),
            })?;
        printer.info("Watching", &display_path(&root));
    }

    let own_map = resolve(&task.paths.sprite_map);
    while let Some(event) = rx.recv().await {
        if !is_relevant(&event, &own_map) {
            continue;
        }
        while let Ok(Some(_)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {}

        if let Err(e) = generate(task, compositor, printer).await {
            printer.error("Failed", &e.to_string());
        }
    }

    Ok(())
}

/// Directories to watch: the literal prefix of every positive pattern.
fn watch_roots(patterns: &[String]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    for pattern in patterns.iter().filter(|p| !p.starts_with('!')) {
        let root = literal_root(pattern);
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

fn literal_root(pattern: &str) -> PathBuf {
    let full = Path::new(pattern);
    let mut root = PathBuf::new();
    for component in full.components() {
        if component
            .as_os_str()
            .to_string_lossy()
            .contains(['*', '?', '['])
        {
            break;
        }
        root.push(component);
    }

    if root == full {
        root = full.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}

/// A change to a source PNG that is not our own sprite map.
///
/// `own_map` is the sprite map as returned by [`resolve`].
fn is_relevant(event: &Event, own_map: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| is_image(path) && resolve(path) != own_map)
}

/// Canonical path when the file exists, else the lexically normalised
/// absolute path.
fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| lexical_absolute(path))
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut normalized = PathBuf::new();
    for component in full.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
