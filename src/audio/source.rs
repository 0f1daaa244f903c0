use anyhow::Result;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use super::decode;
use crate::error::SourceError;

/// One tick's worth of mono unsigned 8-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBlock(Vec<u8>);

impl SampleBlock {
    pub fn new(samples: Vec<u8>) -> Self {
        Self(samples)
    }

    /// A block of silence (every sample at the 8-bit midpoint).
    #[cfg(test)]
    pub fn silence(len: usize) -> Self {
        Self(vec![128; len])
    }

    pub fn samples(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Where the pipeline gets its samples from.
pub trait SampleSource {
    /// Blocks until exactly `block_size()` samples are available.
    fn fetch_block(&mut self) -> Result<SampleBlock, SourceError>;

    fn block_size(&self) -> usize;

    fn sample_rate(&self) -> u32;

    /// Human-readable name for logs and the debug overlay.
    fn describe(&self) -> String;

    /// Number of blocks the source will ever yield, when known up front.
    fn total_blocks(&self) -> Option<u64> {
        None
    }
}

/// Float sample in [-1, 1] to unsigned 8-bit PCM.
pub fn to_pcm8(sample: f32) -> u8 {
    ((sample.clamp(-1.0, 1.0) * 127.0).round() + 128.0) as u8
}

/// Replays a decoded file block by block, optionally at its real rate.
pub struct FileSource {
    name: String,
    samples: Vec<u8>,
    sample_rate: u32,
    block_size: usize,
    position: usize,
    pacing: Option<Pacing>,
}

struct Pacing {
    block_duration: Duration,
    started: Option<Instant>,
    delivered: u32,
}

impl Pacing {
    fn wait_turn(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = started + self.block_duration * self.delivered;
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
        self.delivered += 1;
    }
}

impl FileSource {
    pub fn open(path: &Path, block_size: usize, paced: bool) -> Result<Self> {
        let pcm = decode::decode_pcm8(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_samples(name, pcm.samples, pcm.sample_rate, block_size).paced(paced))
    }

    pub fn from_samples(name: String, samples: Vec<u8>, sample_rate: u32, block_size: usize) -> Self {
        Self {
            name,
            samples,
            sample_rate,
            block_size,
            position: 0,
            pacing: None,
        }
    }

    /// Deliver blocks no faster than the file's sample rate.
    pub fn paced(mut self, paced: bool) -> Self {
        self.pacing = (paced && self.sample_rate > 0).then(|| Pacing {
            block_duration: Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64),
            started: None,
            delivered: 0,
        });
        self
    }
}

impl SampleSource for FileSource {
    fn fetch_block(&mut self) -> Result<SampleBlock, SourceError> {
        let end = self.position + self.block_size;
        if end > self.samples.len() {
            return Err(SourceError::Exhausted);
        }
        if let Some(pacing) = self.pacing.as_mut() {
            pacing.wait_turn();
        }
        let block = SampleBlock::new(self.samples[self.position..end].to_vec());
        self.position = end;
        Ok(block)
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn describe(&self) -> String {
        format!("file {}", self.name)
    }

    fn total_blocks(&self) -> Option<u64> {
        Some((self.samples.len() / self.block_size.max(1)) as u64)
    }
}
