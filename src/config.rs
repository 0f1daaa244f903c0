use serde::Deserialize;
use std::path::Path;

use crate::spectrum::settings::{FilterMode, PipelineConfig};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default = "default_amp_scalar")]
    pub amp_scalar: u32,
    #[serde(default = "default_decay")]
    pub decay: i32,
    #[serde(default = "default_mode")]
    pub mode: FilterMode,
    #[serde(default = "default_range")]
    pub range: u32,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSection {
    #[serde(default = "default_device")]
    pub device: usize,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisplaySection {
    #[serde(default)]
    pub debug: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            amp_scalar: default_amp_scalar(),
            decay: default_decay(),
            mode: default_mode(),
            range: default_range(),
            alpha: default_alpha(),
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl PipelineSection {
    pub fn settings(&self) -> PipelineConfig {
        PipelineConfig {
            amp_scalar: self.amp_scalar,
            decay: self.decay,
            mode: self.mode,
            range: self.range,
            alpha: self.alpha,
        }
    }
}

fn default_block_size() -> usize { 256 }
fn default_amp_scalar() -> u32 { PipelineConfig::default().amp_scalar }
fn default_decay() -> i32 { PipelineConfig::default().decay }
fn default_mode() -> FilterMode { PipelineConfig::default().mode }
fn default_range() -> u32 { PipelineConfig::default().range }
fn default_alpha() -> f32 { PipelineConfig::default().alpha }
fn default_device() -> usize { 1 }
fn default_sample_rate() -> u32 { 10_000 }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::debug!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}
