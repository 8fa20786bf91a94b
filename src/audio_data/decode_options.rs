use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Target sample rate for resampling (None = keep original)
    pub target_sample_rate: Option<u32>,
    /// Maximum duration to decode (None = decode everything)
    pub max_duration: Option<Duration>,
    /// Container hint such as "wav" or "mp3"; probing works without it
    pub extension_hint: Option<String>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_sample_rate(mut self, rate: u32) -> Self {
        self.target_sample_rate = Some(rate);
        self
    }

    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    pub fn extension_hint(mut self, ext: impl Into<String>) -> Self {
        self.extension_hint = Some(ext.into());
        self
    }
}
