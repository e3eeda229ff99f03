//! Platform notification surface.

use std::future::Future;
use std::sync::Arc;

use hava_services::PermissionState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Page to focus or open when the notification is clicked.
    pub target_url: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification permission not granted")]
    NotPermitted,

    #[error("Failed to post notification: {0}")]
    Platform(String),
}

pub trait PlatformNotifier: Send + Sync {
    /// Current permission as the platform reports it.
    fn permission(&self) -> PermissionState;

    /// Show the permission prompt and return the user's answer.
    fn request_permission(&self) -> impl Future<Output = PermissionState> + Send;

    fn post(&self, notification: &PlatformNotification) -> Result<(), NotifyError>;
}

impl<T: PlatformNotifier> PlatformNotifier for Arc<T> {
    fn permission(&self) -> PermissionState {
        (**self).permission()
    }

    fn request_permission(&self) -> impl Future<Output = PermissionState> + Send {
        (**self).request_permission()
    }

    fn post(&self, notification: &PlatformNotification) -> Result<(), NotifyError> {
        (**self).post(notification)
    }
}

/// Writes notifications to the log. Used by the headless binary, where
/// there is no desktop notification surface to prompt for.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl PlatformNotifier for TracingNotifier {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn post(&self, notification: &PlatformNotification) -> Result<(), NotifyError> {
        tracing::info!(
            target: "hava::notification",
            title = %notification.title,
            url = %notification.target_url,
            "{}",
            notification.body
        );
        Ok(())
    }
}
