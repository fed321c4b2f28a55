mod capture;
mod playback;
mod simulated;

pub use capture::{AudioCapture, LocalStream};
pub use playback::{AudioPlayback, target_name};
pub use simulated::{SimulatedMicrophone, SimulatedStream, TrackingPlayback};
