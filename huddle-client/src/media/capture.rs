use crate::error::CaptureError;
use async_trait::async_trait;
use std::sync::Arc;

/// Local microphone audio shared by every outgoing and answered call.
pub trait LocalStream: Send + Sync {
    /// Enables or silences every audio track (mute).
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    /// Stops capture for good. Called once, on leave.
    fn stop(&self);
}

#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Asks for microphone access.
    async fn acquire(&self) -> Result<Arc<dyn LocalStream>, CaptureError>;
}
