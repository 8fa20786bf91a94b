use crate::error::DecodeError;

/// Offline sample-rate converter for decoded buffers.
///
/// Buffers are converted once, when a source is registered, so the render
/// thread only ever reads samples at the output rate.
pub struct AudioResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,
    chunk_size: usize,
}

impl AudioResampler {
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: u16,
        chunk_size: Option<usize>,
    ) -> Result<Self, DecodeError> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(DecodeError::Resample(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if channels == 0 {
            return Err(DecodeError::Resample(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            channels,
            chunk_size: chunk_size.unwrap_or(1024),
        })
    }

    /// Number of output frames expected for `input_frames` source frames.
    pub fn output_frames(&self, input_frames: usize) -> usize {
        (input_frames as f64 * self.resample_ratio()).ceil() as usize
    }

    pub fn resample_channel(&self, channel_samples: &[f32]) -> Result<Vec<f32>, DecodeError> {
        if self.source_sample_rate == self.target_sample_rate {
            return Ok(channel_samples.to_vec());
        }

        use rubato::{FftFixedIn, Resampler};

        let mut resampler = FftFixedIn::<f32>::new(
            self.source_sample_rate as usize,
            self.target_sample_rate as usize,
            self.chunk_size,
            2, // sub_chunks
            1,
        )
        .map_err(|e| DecodeError::Resample(format!("Failed to create resampler: {}", e)))?;

        let mut output_buffer = Vec::with_capacity(self.output_frames(channel_samples.len()));

        for chunk in channel_samples.chunks(self.chunk_size) {
            // The fixed-input resampler wants full chunks; the tail is zero padded
            let mut input_chunk = vec![0.0f32; self.chunk_size];
            input_chunk[..chunk.len()].copy_from_slice(chunk);

            let waves_out = resampler
                .process(&[input_chunk], None)
                .map_err(|e| DecodeError::Resample(e.to_string()))?;

            if let Some(first_channel) = waves_out.first() {
                output_buffer.extend_from_slice(first_channel);
            }
        }

        output_buffer.truncate(self.output_frames(channel_samples.len()));
        Ok(output_buffer)
    }

    pub fn resample_interleaved(&self, interleaved_samples: &[f32]) -> Result<Vec<f32>, DecodeError> {
        if self.source_sample_rate == self.target_sample_rate {
            return Ok(interleaved_samples.to_vec());
        }

        let channels = self.channels as usize;

        let mut resampled_channels = Vec::with_capacity(channels);
        for ch in 0..channels {
            let channel_data: Vec<f32> = interleaved_samples
                .chunks(channels)
                .map(|frame| frame.get(ch).copied().unwrap_or(0.0))
                .collect();
            resampled_channels.push(self.resample_channel(&channel_data)?);
        }

        let new_frames = resampled_channels
            .iter()
            .map(Vec::len)
            .min()
            .unwrap_or(0);

        let mut interleaved = Vec::with_capacity(new_frames * channels);
        for frame_idx in 0..new_frames {
            for channel in &resampled_channels {
                interleaved.push(channel[frame_idx]);
            }
        }

        Ok(interleaved)
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    pub fn resample_ratio(&self) -> f64 {
        self.target_sample_rate as f64 / self.source_sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampler_creation() {
        let resampler = AudioResampler::new(44100, 48000, 2, None);
        assert!(resampler.is_ok());

        let resampler = resampler.unwrap();
        assert_eq!(resampler.source_sample_rate(), 44100);
        assert_eq!(resampler.target_sample_rate(), 48000);
    }

    #[test]
    fn test_resampler_no_resampling_needed() {
        let resampler = AudioResampler::new(44100, 44100, 1, None).unwrap();
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let result = resampler.resample_channel(&samples).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn test_invalid_sample_rates() {
        assert!(AudioResampler::new(0, 48000, 2, None).is_err());
        assert!(AudioResampler::new(44100, 0, 2, None).is_err());
        assert!(AudioResampler::new(44100, 48000, 0, None).is_err());
    }

    #[test]
    fn test_upsampling_scales_length() {
        let resampler = AudioResampler::new(24000, 48000, 2, Some(512)).unwrap();
        let interleaved = vec![0.25f32; 2 * 2400];
        let out = resampler.resample_interleaved(&interleaved).unwrap();
        assert_eq!(out.len(), 2 * 4800);
    }
}
