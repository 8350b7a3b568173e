//! Capture device scoped acquisition
//!
//! A camera stream is acquired by `CaptureGuard::acquire` and released when the guard
//! drops. Success, error, early return and unwinding all release it exactly once.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to grab frame: {0}")]
    FrameUnavailable(String),
}

/// Raw camera access (platform specific, supplied by the host)
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open the stream
    async fn open(&self) -> Result<(), CaptureError>;

    /// Grab one still frame as a base64 data URL
    async fn grab_frame(&self) -> Result<String, CaptureError>;

    /// Close the stream; must tolerate being called on an already closed device
    fn release(&self);
}

/// Open device stream, released on drop
pub struct CaptureGuard {
    device: Arc<dyn CaptureDevice>,
    released: bool,
}

impl CaptureGuard {
    /// Open `device`; on failure nothing is held and nothing needs releasing
    pub async fn acquire(device: Arc<dyn CaptureDevice>) -> Result<Self, CaptureError> {
        device.open().await?;
        tracing::debug!("Capture device opened");
        Ok(Self {
            device,
            released: false,
        })
    }

    pub async fn grab_frame(&self) -> Result<String, CaptureError> {
        self.device.grab_frame().await
    }

    /// Release now instead of at end of scope
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.device.release();
            tracing::debug!("Capture device released");
        }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}
