//! Camera/microphone acquisition seam.
//!
//! Acquisition is the only naturally suspending operation in the engine,
//! so the trait returns a boxed future the startup path awaits without
//! blocking the screen sampler. Permission denial is a distinct,
//! recoverable condition: the session continues with screen-only
//! monitoring.
//!
//! A live handle must release its capture tracks when stopped, and again
//! on drop, so teardown through any error path still frees the device.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Errors from media acquisition.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Camera/microphone permission denied")]
    PermissionDenied,

    #[error("Media device unavailable: {0}")]
    Unavailable(String),
}

/// A live audio/video capture stream.
pub trait MediaHandle: Send {
    /// Stop all capture tracks. Idempotent.
    fn stop(&mut self);
}

pub type AcquireFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Box<dyn MediaHandle>, MediaError>> + Send + 'a>>;

/// Platform media acquisition (getUserMedia equivalent).
pub trait MediaSource: Send + Sync {
    fn acquire(&self) -> AcquireFuture<'_>;
}

/// In-process media source for tests and the CLI simulator. Tracks
/// whether the fabricated stream is still live so release can be
/// asserted.
pub struct SimulatedMedia {
    grant: bool,
    live: Arc<AtomicBool>,
}

impl SimulatedMedia {
    /// A source whose permission prompt is accepted.
    pub fn granted() -> Self {
        Self {
            grant: true,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A source whose permission prompt is refused.
    pub fn denied() -> Self {
        Self {
            grant: false,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether an acquired stream is still holding the device.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl MediaSource for SimulatedMedia {
    fn acquire(&self) -> AcquireFuture<'_> {
        let grant = self.grant;
        let live = self.live.clone();
        Box::pin(async move {
            if !grant {
                return Err(MediaError::PermissionDenied);
            }
            live.store(true, Ordering::SeqCst);
            Ok(Box::new(SimulatedMediaHandle { live }) as Box<dyn MediaHandle>)
        })
    }
}

struct SimulatedMediaHandle {
    live: Arc<AtomicBool>,
}

impl MediaHandle for SimulatedMediaHandle {
    fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

impl Drop for SimulatedMediaHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn granted_stream_releases_on_stop() {
        let media = SimulatedMedia::granted();
        let mut handle = media.acquire().await.unwrap();
        assert!(media.is_live());

        handle.stop();
        assert!(!media.is_live());
    }

    #[tokio::test]
    async fn dropped_stream_releases_tracks() {
        let media = SimulatedMedia::granted();
        let handle = media.acquire().await.unwrap();
        assert!(media.is_live());

        drop(handle);
        assert!(!media.is_live());
    }

    #[tokio::test]
    async fn denied_source_reports_permission_denied() {
        let media = SimulatedMedia::denied();
        let result = media.acquire().await;
        assert!(matches!(result, Err(MediaError::PermissionDenied)));
        assert!(!media.is_live());
    }
}
