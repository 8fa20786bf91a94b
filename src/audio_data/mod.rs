mod decode_options;
mod resampler;
mod symphonia_decoder;

use crate::error::DecodeError;
pub use decode_options::DecodeOptions;
pub use resampler::AudioResampler;
use std::sync::Arc;
use std::time::Duration;

pub use symphonia_decoder::decode_audio_bytes;

/// Decoded, immutable audio content. Cloning shares the sample storage.
#[derive(Debug, Clone)]
pub struct CadenzaAudioData {
    inner: Arc<AudioDataInner>,
}

#[derive(Debug)]
pub(crate) struct AudioDataInner {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
    pub total_frames: usize,
}

impl CadenzaAudioData {
    /// Wraps already-decoded interleaved samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, duration: Duration) -> Self {
        let total_frames = samples.len() / channels.max(1) as usize;
        Self {
            inner: Arc::new(AudioDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        }
    }

    /// Decodes raw container bytes with default options.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, DecodeError> {
        decode_audio_bytes(bytes.into(), &DecodeOptions::default())
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.samples.len()
    }

    /// Sample of `channel` in frame `frame`, or None past the end.
    ///
    /// Channels beyond the buffer's own count wrap, so mono content feeds
    /// every output channel.
    pub fn sample(&self, frame: usize, channel: usize) -> Option<f32> {
        let channels = self.inner.channels as usize;
        if frame >= self.inner.total_frames || channels == 0 {
            return None;
        }
        self.inner
            .samples
            .get(frame * channels + channel % channels)
            .copied()
    }

    /// Get samples for a specific channel (0-indexed)
    pub fn channel_samples(&self, channel: usize) -> Result<Vec<f32>, DecodeError> {
        if channel >= self.inner.channels as usize {
            return Err(DecodeError::Malformed(format!(
                "Channel {} out of range (max: {})",
                channel,
                self.inner.channels.saturating_sub(1)
            )));
        }

        Ok(self
            .inner
            .samples
            .chunks(self.inner.channels as usize)
            .map(|frame| frame[channel])
            .collect())
    }

    /// Resample to a different sample rate using rubato
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self, DecodeError> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = AudioResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            Some(1024),
        )?;

        let resampled_samples = resampler.resample_interleaved(&self.inner.samples)?;

        let new_duration = Duration::from_secs_f64(
            resampled_samples.len() as f64
                / (target_sample_rate * self.inner.channels as u32) as f64,
        );

        Ok(Self::new(
            resampled_samples,
            target_sample_rate,
            self.inner.channels,
            new_duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp() -> CadenzaAudioData {
        let samples = vec![0.0, 1.0, 0.1, 1.1, 0.2, 1.2];
        CadenzaAudioData::new(samples, 100, 2, Duration::from_millis(30))
    }

    #[test]
    fn test_frame_accounting() {
        let data = stereo_ramp();
        assert_eq!(data.total_frames(), 3);
        assert_eq!(data.len(), 6);
        assert!(!data.is_empty());
    }

    #[test]
    fn test_sample_lookup_wraps_channels() {
        let data = stereo_ramp();
        assert_eq!(data.sample(1, 0), Some(0.1));
        assert_eq!(data.sample(1, 1), Some(1.1));
        assert_eq!(data.sample(1, 3), Some(1.1));
        assert_eq!(data.sample(3, 0), None);
    }

    #[test]
    fn test_channel_samples() {
        let data = stereo_ramp();
        assert_eq!(data.channel_samples(1).unwrap(), vec![1.0, 1.1, 1.2]);
        assert!(data.channel_samples(2).is_err());
    }

    #[test]
    fn test_resample_same_rate_shares_storage() {
        let data = stereo_ramp();
        let same = data.resample(100).unwrap();
        assert!(std::ptr::eq(data.samples(), same.samples()));
    }
}
