/// Counters for debugging a capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub captures_requested: u64,
    pub images_delivered: u64,
    pub capture_failures: u64,
    pub frames_received: u64,
    pub lighting_samples: u64,
    /// Photo completions that arrived after the session was stopped.
    pub orphaned_completions: u64,
}
