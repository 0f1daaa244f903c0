use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use super::magnitude;
use super::settings::PipelineConfig;
use super::smoothing;
use super::transform::{self, RealTransform};
use crate::audio::source::{SampleBlock, SampleSource};
use crate::control::ControlCommand;
use crate::error::{PipelineError, SourceError};
use crate::render::{Frame, Renderer};
use crate::shutdown::ShutdownFlag;

/// The whole analysis state: settings, the persistent bin amplitudes and
/// every working buffer, all sized once at construction.
pub struct SpectrumPipeline {
    config: PipelineConfig,
    bins: Vec<f32>,
    samples: Vec<f32>,
    coeffs: Vec<f32>,
    scratch: Vec<f32>,
    transform: RealTransform,
    ticks: u64,
}

impl SpectrumPipeline {
    pub fn new(block_size: usize, config: PipelineConfig) -> Result<Self, PipelineError> {
        if !transform::is_valid_size(block_size) {
            return Err(PipelineError::InvalidBlockSize(block_size));
        }
        Ok(Self {
            config,
            bins: vec![0.0; block_size],
            samples: vec![0.0; block_size],
            coeffs: vec![0.0; block_size],
            scratch: vec![0.0; block_size],
            transform: RealTransform::new(block_size),
            ticks: 0,
        })
    }

    pub fn block_size(&self) -> usize {
        self.transform.size()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Only call between ticks.
    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Processes one block and returns the updated bins.
    ///
    /// A block of the wrong length is rejected before any state changes.
    pub fn tick(&mut self, block: &SampleBlock) -> Result<&[f32], PipelineError> {
        self.analyze(block)?;
        self.smooth();
        self.ticks += 1;
        Ok(&self.bins)
    }

    /// Pre-scale, transform and attack/decay fusion.
    fn analyze(&mut self, block: &SampleBlock) -> Result<(), PipelineError> {
        if block.len() != self.block_size() {
            return Err(PipelineError::BlockLength {
                expected: self.block_size(),
                actual: block.len(),
            });
        }
        transform::prescale(block.samples(), self.config.amp_scalar, &mut self.samples);
        self.transform.process(&self.samples, &mut self.coeffs);
        magnitude::fuse(&mut self.coeffs, &mut self.bins, self.config.decay_factor());
        Ok(())
    }

    fn smooth(&mut self) {
        smoothing::apply(
            self.config.mode,
            &mut self.bins,
            &mut self.scratch,
            self.config.range as usize,
            self.config.effective_alpha(),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    ShutdownRequested,
}

#[derive(Debug)]
pub struct RunSummary {
    pub ticks: u64,
    pub reason: StopReason,
}

/// Smoothed ticks-per-second estimate for the overlay.
struct TickRate {
    last: Option<Instant>,
    rate: f32,
}

impl TickRate {
    fn new() -> Self {
        Self { last: None, rate: 0.0 }
    }

    fn update(&mut self) -> f32 {
        let now = Instant::now();
        if let Some(last) = self.last.replace(now) {
            let secs = now.duration_since(last).as_secs_f32();
            if secs > 0.0 {
                let instant = 1.0 / secs;
                self.rate = if self.rate == 0.0 { instant } else { 0.9 * self.rate + 0.1 * instant };
            }
        }
        self.rate
    }
}

pub struct RunOptions<'a> {
    pub control: Option<&'a Receiver<ControlCommand>>,
    pub shutdown: &'a ShutdownFlag,
    pub progress: Option<&'a ProgressBar>,
}

/// Ticks until the source runs dry or shutdown is requested.
///
/// Settings commands are applied before a tick starts; shutdown is checked
/// at the same boundary, so a started tick always completes and is rendered.
/// Any source or pipeline failure ends the loop with an error and no frame
/// is rendered for that tick. The renderer is finished on every exit path.
pub fn run(
    pipeline: &mut SpectrumPipeline,
    source: &mut dyn SampleSource,
    renderer: &mut dyn Renderer,
    options: RunOptions<'_>,
) -> Result<RunSummary> {
    let outcome = tick_loop(pipeline, source, renderer, &options);
    let finished = renderer.finish();
    let reason = outcome?;
    finished?;
    Ok(RunSummary {
        ticks: pipeline.ticks(),
        reason,
    })
}

fn tick_loop(
    pipeline: &mut SpectrumPipeline,
    source: &mut dyn SampleSource,
    renderer: &mut dyn Renderer,
    options: &RunOptions<'_>,
) -> Result<StopReason> {
    let source_name = source.describe();
    let mut rate = TickRate::new();

    loop {
        if let Some(control) = options.control {
            for command in control.try_iter() {
                match command {
                    ControlCommand::Settings(change) => pipeline.config_mut().apply(change),
                    ControlCommand::ToggleOverlay => renderer.toggle_overlay(),
                    ControlCommand::Quit => options.shutdown.request(),
                }
            }
        }
        if options.shutdown.is_requested() {
            return Ok(StopReason::ShutdownRequested);
        }

        let block = match source.fetch_block() {
            Ok(block) => block,
            Err(SourceError::Exhausted) => return Ok(StopReason::SourceExhausted),
            Err(SourceError::Interrupted) => return Ok(StopReason::ShutdownRequested),
            Err(err) => return Err(err).with_context(|| format!("Sample source {} failed", source_name)),
        };

        pipeline.tick(&block).context("Spectrum tick failed")?;
        log::trace!(
            "tick {}: peak {:.3}",
            pipeline.ticks(),
            pipeline.bins().iter().copied().fold(0.0f32, f32::max)
        );

        let frame = Frame {
            tick: pipeline.ticks(),
            bins: pipeline.bins(),
            config: pipeline.config(),
            source: &source_name,
            ticks_per_second: rate.update(),
        };
        renderer.render(&frame)?;

        if let Some(progress) = options.progress {
            progress.inc(1);
        }
    }
}
