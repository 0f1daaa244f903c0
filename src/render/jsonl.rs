use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::{Frame, Renderer};

#[derive(Serialize)]
struct FrameRecord<'a> {
    tick: u64,
    bins: &'a [f32],
}

/// Writes one `{"tick":n,"bins":[...]}` object per line.
pub struct JsonLinesRenderer<W: Write> {
    out: W,
}

impl JsonLinesRenderer<Box<dyn Write>> {
    /// Writes to `path`, or to stdout when no path is given.
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout())),
        };
        Ok(Self::new(out))
    }
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        let record = FrameRecord {
            tick: frame.tick,
            bins: frame.bins,
        };
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush frame output")
    }
}
