pub mod bars;
pub mod jsonl;
pub mod terminal;

use anyhow::Result;

use crate::spectrum::settings::PipelineConfig;

/// Everything a renderer may show for one tick. Bins are read-only.
pub struct Frame<'a> {
    pub tick: u64,
    pub bins: &'a [f32],
    pub config: &'a PipelineConfig,
    pub source: &'a str,
    pub ticks_per_second: f32,
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()>;

    /// Shows or hides the settings overlay, if the renderer has one.
    fn toggle_overlay(&mut self) {}

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Runs the pipeline without drawing anything.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _frame: &Frame<'_>) -> Result<()> {
        Ok(())
    }
}
