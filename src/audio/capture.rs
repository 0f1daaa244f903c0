use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig, StreamError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::source::{to_pcm8, SampleBlock, SampleSource};
use crate::error::SourceError;
use crate::shutdown::ShutdownFlag;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Captured samples kept before the oldest are dropped, in blocks.
const FIFO_BLOCKS: usize = 64;

/// Names of all capture devices, in enumeration order.
pub fn list_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("Failed to enumerate capture devices")?;
    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("Capture lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// State shared between the device callback and the pipeline thread.
struct CaptureBuffer {
    fifo: Mutex<VecDeque<u8>>,
    capacity: usize,
    failure: Mutex<Option<String>>,
}

impl CaptureBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            fifo: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            failure: Mutex::new(None),
        }
    }

    fn push(&self, samples: impl Iterator<Item = u8>) {
        let mut fifo = lock(&self.fifo);
        for sample in samples {
            if fifo.len() == self.capacity {
                fifo.pop_front();
            }
            fifo.push_back(sample);
        }
    }

    fn take_block(&self, block_size: usize) -> Option<SampleBlock> {
        let mut fifo = lock(&self.fifo);
        (fifo.len() >= block_size).then(|| SampleBlock::new(fifo.drain(..block_size).collect()))
    }

    fn fail(&self, reason: String) {
        lock(&self.failure).get_or_insert(reason);
    }

    fn failure(&self) -> Option<String> {
        lock(&self.failure).clone()
    }
}

/// Live mono 8-bit capture from an input device.
///
/// The device stream runs on its own callback thread and appends to a
/// bounded FIFO; [`fetch_block`](SampleSource::fetch_block) polls that FIFO
/// until a full block is present. Dropping the source stops the stream.
pub struct CaptureSource {
    name: String,
    sample_rate: u32,
    block_size: usize,
    buffer: Arc<CaptureBuffer>,
    shutdown: ShutdownFlag,
    _stream: Stream,
}

impl CaptureSource {
    pub fn open(
        device_index: Option<usize>,
        sample_rate: u32,
        block_size: usize,
        shutdown: ShutdownFlag,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = pick_device(&host, device_index)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let (config, format) = select_config(&device, sample_rate)?;
        let buffer = Arc::new(CaptureBuffer::new(block_size * FIFO_BLOCKS));

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, &buffer, |s| s)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, &buffer, |s| s as f32 / 32768.0)?,
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, &buffer, |s| (s as f32 - 32768.0) / 32768.0)?
            }
            SampleFormat::U8 => build_stream::<u8>(&device, &config, &buffer, |s| (s as f32 - 128.0) / 128.0)?,
            other => anyhow::bail!("Unsupported capture sample format: {:?}", other),
        };
        stream.play().context("Failed to start capture stream")?;

        log::info!(
            "Capturing from '{}' ({} ch @ {} Hz, {:?})",
            name,
            config.channels,
            config.sample_rate.0,
            format
        );

        Ok(Self {
            name,
            sample_rate: config.sample_rate.0,
            block_size,
            buffer,
            shutdown,
            _stream: stream,
        })
    }
}

impl SampleSource for CaptureSource {
    fn fetch_block(&mut self) -> Result<SampleBlock, SourceError> {
        loop {
            if let Some(reason) = self.buffer.failure() {
                return Err(SourceError::DeviceLost(reason));
            }
            if let Some(block) = self.buffer.take_block(self.block_size) {
                return Ok(block);
            }
            if self.shutdown.is_requested() {
                return Err(SourceError::Interrupted);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn describe(&self) -> String {
        format!("device {}", self.name)
    }
}

fn pick_device(host: &cpal::Host, index: Option<usize>) -> Result<Device> {
    if let Some(index) = index {
        let mut devices = host
            .input_devices()
            .context("Failed to enumerate capture devices")?;
        if let Some(device) = devices.nth(index) {
            return Ok(device);
        }
        log::warn!("No capture device at index {}, using the default input", index);
    }
    host.default_input_device()
        .context("No capture devices found")
}

fn select_config(device: &Device, sample_rate: u32) -> Result<(StreamConfig, SampleFormat)> {
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map(|configs| configs.collect())
        .unwrap_or_default();

    let fits = |r: &&cpal::SupportedStreamConfigRange| {
        r.min_sample_rate().0 <= sample_rate && r.max_sample_rate().0 >= sample_rate
    };
    let preferred = ranges
        .iter()
        .filter(fits)
        .min_by_key(|r| r.channels());
    if let Some(range) = preferred {
        let supported = range.clone().with_sample_rate(SampleRate(sample_rate));
        return Ok((supported.config(), supported.sample_format()));
    }

    let fallback = device
        .default_input_config()
        .context("Capture device has no default input format")?;
    log::warn!(
        "Device cannot capture at {} Hz, using {} Hz",
        sample_rate,
        fallback.sample_rate().0
    );
    Ok((fallback.config(), fallback.sample_format()))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    buffer: &Arc<CaptureBuffer>,
    to_float: fn(T) -> f32,
) -> Result<Stream>
where
    T: SizedSample + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    let data_buffer = Arc::clone(buffer);
    let error_buffer = Arc::clone(buffer);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                data_buffer.push(data.chunks(channels).map(|frame| {
                    let sum: f32 = frame.iter().map(|&s| to_float(s)).sum();
                    to_pcm8(sum / frame.len() as f32)
                }));
            },
            move |err: StreamError| match err {
                StreamError::DeviceNotAvailable => error_buffer.fail(err.to_string()),
                other => log::warn!("Capture stream error: {}", other),
            },
            None,
        )
        .context("Failed to build capture stream")?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_block_waits_for_enough_samples() {
        let buffer = CaptureBuffer::new(64);
        buffer.push([1u8, 2, 3].into_iter());
        assert!(buffer.take_block(4).is_none());
        buffer.push([4u8, 5].into_iter());
        let block = buffer.take_block(4).unwrap();
        assert_eq!(block.samples(), &[1, 2, 3, 4]);
        assert_eq!(lock(&buffer.fifo).len(), 1);
    }

    #[test]
    fn full_fifo_drops_oldest_samples() {
        let buffer = CaptureBuffer::new(4);
        buffer.push(0u8..6);
        let block = buffer.take_block(4).unwrap();
        assert_eq!(block.samples(), &[2, 3, 4, 5]);
    }

    #[test]
    fn first_failure_is_kept() {
        let buffer = CaptureBuffer::new(4);
        assert!(buffer.failure().is_none());
        buffer.fail("unplugged".into());
        buffer.fail("later".into());
        assert_eq!(buffer.failure().as_deref(), Some("unplugged"));
    }
}
