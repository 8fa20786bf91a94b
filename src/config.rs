//! Configuration for Cadenza

use crate::error::{CadenzaError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CadenzaConfig {
    /// Output stream sample rate; decoded buffers are resampled to it
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u16,
    /// Frames per hardware callback block
    pub block_size: usize,
    /// Cadence of the time-update tick, in Hz
    pub refresh_rate: f64,
}

impl Default for CadenzaConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            block_size: 512,
            refresh_rate: 60.0,
        }
    }
}

impl CadenzaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn refresh_rate(mut self, hz: f64) -> Self {
        self.refresh_rate = hz;
        self
    }

    /// Period between two ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CadenzaError::Configuration(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(CadenzaError::Configuration(
                "Channel count must be greater than 0".to_string(),
            ));
        }
        if self.block_size == 0 {
            return Err(CadenzaError::Configuration(
                "Block size must be greater than 0".to_string(),
            ));
        }
        if !self.refresh_rate.is_finite() || self.refresh_rate <= 0.0 {
            return Err(CadenzaError::Configuration(format!(
                "Refresh rate must be a positive number of Hz, got {}",
                self.refresh_rate
            )));
        }
        Ok(())
    }
}
