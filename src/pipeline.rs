//! One sprite task, end to end.
//!
//! collect → encode → compose → (stylesheet, write). Every error is
//! terminal for the run; the renderer is invoked at most once. The
//! composite must carry one height per image whatever the compositor.

use std::path::PathBuf;

use crate::bridge::Compositor;
use crate::collect::collect_assets;
use crate::config::SpriteTask;
use crate::encode::encode_assets;
use crate::error::{Result, SpriteError};
use crate::output::{display_path, plural, Printer};
use crate::stylesheet::StylesheetGenerator;
use crate::writer::write_outputs;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteReport {
    /// Number of images sprited.
    pub images: usize,
    pub sprite_map: PathBuf,
    pub stylesheet: PathBuf,
    /// Composite dimensions, when the header could be read.
    pub dimensions: Option<(u32, u32)>,
}

/// Run `task` against `compositor`.
pub async fn generate<C>(task: &SpriteTask, compositor: &C, printer: &Printer) -> Result<SpriteReport>
where
    C: Compositor + ?Sized,
{
    printer.status("Collecting", &task.src.join(", "));
    let paths = collect_assets(&task.src)?;
    if paths.is_empty() {
        return Err(SpriteError::NoImages {
            patterns: task.src.join(", "),
        });
    }

    printer.status("Encoding", &plural(paths.len(), "image", "images"));
    let batch = encode_assets(&paths, task.spacing).await?;

    printer.status(
        "Rendering",
        &format!(
            "{} {}",
            plural(batch.len(), "image", "images"),
            printer.dim(&format!("(spacing {}px)", batch.spacing()))
        ),
    );
    let composite = compositor.compose(&batch).await?;
    if composite.heights().len() != batch.len() {
        return Err(SpriteError::malformed(format!(
            "compositor returned {} height(s) for {} image(s)",
            composite.heights().len(),
            batch.len()
        )));
    }

    let stylesheet = StylesheetGenerator::new(&task.paths, &task.class_prefix, task.dialect)
        .render(&batch, &composite);

    printer.status(
        "Writing",
        &format!(
            "{} {}",
            printer.cyan(&display_path(&task.paths.sprite_map)),
            printer.cyan(&display_path(&task.paths.stylesheet))
        ),
    );
    write_outputs(&task.paths, composite.image(), &stylesheet).await?;

    let report = SpriteReport {
        images: batch.len(),
        sprite_map: task.paths.sprite_map.clone(),
        stylesheet: task.paths.stylesheet.clone(),
        dimensions: composite.dimensions(),
    };

    let size = report
        .dimensions
        .map(|(w, h)| format!(" {}", printer.dim(&format!("({}x{})", w, h))))
        .unwrap_or_default();
    printer.success(
        "Finished",
        &format!(
            "{} & {} stylesheet {}{}",
            display_path(&report.sprite_map),
            task.dialect.as_str(),
            display_path(&report.stylesheet),
            size
        ),
    );

    Ok(report)
}
