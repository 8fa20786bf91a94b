//! Event types for Cadenza

#[derive(Debug, Clone, PartialEq)]
pub enum CadenzaEvent {
    SourceAdded {
        name: String,
        duration: f64,
    },
    SourceReplaced {
        name: String,
    },
    SourceRemoved {
        name: String,
    },
    SourceStarted {
        name: String,
        position: f64,
        clock_time: f64,
    },
    SourceStopped {
        name: String,
    },
    /// Playback ran to the end of the buffer.
    SourceEnded {
        name: String,
    },
    ClockResumed,
    ClockSuspended,
}

impl CadenzaEvent {
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::SourceAdded { name, .. }
            | Self::SourceReplaced { name }
            | Self::SourceRemoved { name }
            | Self::SourceStarted { name, .. }
            | Self::SourceStopped { name }
            | Self::SourceEnded { name } => Some(name),
            Self::ClockResumed | Self::ClockSuspended => None,
        }
    }

    pub fn is_source_event(&self) -> bool {
        self.source_name().is_some()
    }
}
