mod audio;
mod cli;
mod config;
mod control;
mod error;
mod render;
mod shutdown;
mod spectrum;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use audio::capture::{self, CaptureSource};
use audio::source::{FileSource, SampleSource};
use cli::{Cli, OutputMode};
use render::jsonl::JsonLinesRenderer;
use render::terminal::TerminalRenderer;
use render::{NullRenderer, Renderer};
use shutdown::ShutdownFlag;
use spectrum::pipeline::{self, RunOptions, SpectrumPipeline, StopReason};
use spectrum::settings::PipelineConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Explicit --config path, else auvi.toml, else the user config dirs
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("auvi.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("auvi").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("auvi").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Config values apply only where the CLI is at its default
            let defaults = PipelineConfig::default();
            let file = cfg.pipeline.settings();
            if cli.block_size == 256 { cli.block_size = cfg.pipeline.block_size; }
            if cli.amp_scalar == defaults.amp_scalar { cli.amp_scalar = file.amp_scalar; }
            if cli.decay == defaults.decay { cli.decay = file.decay; }
            if cli.mode == defaults.mode { cli.mode = file.mode; }
            if cli.range == defaults.range { cli.range = file.range; }
            if cli.alpha == defaults.alpha { cli.alpha = file.alpha; }
            if cli.device == 1 { cli.device = cfg.capture.device; }
            if cli.sample_rate == 10_000 { cli.sample_rate = cfg.capture.sample_rate; }
            if !cli.debug { cli.debug = cfg.display.debug; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if cli.list_devices {
        let devices = capture::list_devices()?;
        println!("Capture devices:");
        for (idx, name) in devices.iter().enumerate() {
            println!("  {}: {}", idx, name);
        }
        return Ok(());
    }

    let settings = PipelineConfig {
        amp_scalar: cli.amp_scalar,
        decay: cli.decay,
        mode: cli.mode,
        range: cli.range,
        alpha: cli.alpha,
    };
    let mut analyzer = SpectrumPipeline::new(cli.block_size, settings)?;
    let shutdown = ShutdownFlag::with_signal_handlers();

    let mut source: Box<dyn SampleSource> = match cli.input {
        Some(ref input) => {
            if !input.exists() {
                anyhow::bail!("Input file not found: {}", input.display());
            }
            log::info!("Decoding {}...", input.display());
            Box::new(FileSource::open(input, cli.block_size, !cli.fast)?)
        }
        None => Box::new(
            CaptureSource::open(Some(cli.device), cli.sample_rate, cli.block_size, shutdown.clone())
                .context("Failed to open capture device")?,
        ),
    };

    log::info!("auvi - audio spectrum visualizer");
    log::info!("Source: {} @ {} Hz", source.describe(), source.sample_rate());
    log::info!(
        "Block size: {}, mode: {}, range: {}, decay: {}%",
        source.block_size(),
        cli.mode,
        cli.range,
        cli.decay
    );

    let mut renderer: Box<dyn Renderer> = match cli.output {
        OutputMode::Terminal => Box::new(TerminalRenderer::stdout(cli.terminal_size(), cli.debug)),
        OutputMode::Jsonl => Box::new(JsonLinesRenderer::create(cli.out.as_deref())?),
        OutputMode::None => Box::new(NullRenderer),
    };

    let progress = match source.total_blocks() {
        Some(total) if cli.output != OutputMode::Terminal => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({eta} remaining)")?
                    .progress_chars("=>-"),
            );
            Some(pb)
        }
        _ => None,
    };

    let control = control::spawn_stdin_reader();
    let summary = pipeline::run(
        &mut analyzer,
        source.as_mut(),
        renderer.as_mut(),
        RunOptions {
            control: Some(&control),
            shutdown: &shutdown,
            progress: progress.as_ref(),
        },
    )?;

    if let Some(pb) = progress {
        pb.finish_with_message("Done");
    }
    drop(source);

    match summary.reason {
        StopReason::SourceExhausted => log::info!("Input finished after {} ticks", summary.ticks),
        StopReason::ShutdownRequested => log::info!("Stopped after {} ticks", summary.ticks),
    }
    Ok(())
}
