use rodio::Source;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode audio: {0}")]
    Container(#[from] rodio::decoder::DecoderError),
    #[error("invalid sample format: {channels} channel(s) at {sample_rate} Hz")]
    InvalidFormat { channels: u16, sample_rate: u32 },
}

/// A fully decoded clip held in memory.
///
/// Cloning is cheap: the interleaved samples are shared, and every playback
/// streams from its own cursor over them.
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    samples: Arc<[i16]>,
    channels: u16,
    sample_rate: u32,
}

impl SoundBuffer {
    pub fn decode(data: Vec<u8>) -> Result<Self, DecodeError> {
        let decoder = rodio::Decoder::new(Cursor::new(data))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<i16> = decoder.collect();
        Self::from_samples(channels, sample_rate, samples)
    }

    pub fn from_samples(
        channels: u16,
        sample_rate: u32,
        samples: Vec<i16>,
    ) -> Result<Self, DecodeError> {
        if channels == 0 || sample_rate == 0 {
            return Err(DecodeError::InvalidFormat {
                channels,
                sample_rate,
            });
        }
        Ok(Self {
            samples: samples.into(),
            channels,
            sample_rate,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / self.channels as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    /// Streams the whole clip from the first sample.
    pub fn stream(&self) -> ClipSource {
        ClipSource {
            samples: Arc::clone(&self.samples),
            channels: self.channels,
            sample_rate: self.sample_rate,
            pos: 0,
            finished: None,
        }
    }
}

/// Read-only view over a [`SoundBuffer`] that rodio can play.
pub struct ClipSource {
    samples: Arc<[i16]>,
    channels: u16,
    sample_rate: u32,
    pos: usize,
    finished: Option<oneshot::Sender<()>>,
}

impl ClipSource {
    /// Fires `tx` once the last sample has been handed to the mixer.
    /// Dropping the source early closes the channel instead.
    pub fn notify_on_end(mut self, tx: oneshot::Sender<()>) -> Self {
        self.finished = Some(tx);
        self
    }

    fn remaining(&self) -> usize {
        self.samples.len() - self.pos
    }
}

impl Iterator for ClipSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        match self.samples.get(self.pos) {
            Some(&sample) => {
                self.pos += 1;
                Some(sample)
            }
            None => {
                if let Some(tx) = self.finished.take() {
                    let _ = tx.send(());
                }
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl Source for ClipSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.remaining())
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let frames = self.samples.len() / self.channels as usize;
        Some(Duration::from_secs_f64(
            frames as f64 / self.sample_rate as f64,
        ))
    }
}
