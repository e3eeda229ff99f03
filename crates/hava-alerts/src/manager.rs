//! Severe-weather polling for favorite locations.
//!
//! The manager is either Idle or Active. It is Active only while
//! notifications are enabled, the platform permission is granted and at
//! least one favorite exists. Entering Active runs a pass immediately and
//! then one every poll interval. Each pass fetches favorites one at a time,
//! evaluates them, and emits every alert to the platform, the notification
//! log and the in-app toast channel.
//!
//! Settings and favorites are re-read from storage before each pass and
//! again before emitting, so a pass that finishes after the manager went
//! Idle (or after shutdown) is dropped.

use std::sync::Arc;
use std::time::Duration;

use hava_core::AlertsConfig;
use hava_services::{
    FavoriteLocation, FavoritesStore, NotificationKind, NotificationLog, PermissionState,
    Settings, SettingsStore, StoredNotification,
};
use hava_weather::WeatherSource;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::AlertError;
use crate::evaluator::{evaluate, Alert};
use crate::notifier::{PlatformNotification, PlatformNotifier};

const TOAST_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    NotificationsDisabled,
    PermissionNotGranted,
    NoFavorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerMode {
    Idle(IdleReason),
    Active,
}

impl ManagerMode {
    pub fn is_active(&self) -> bool {
        matches!(self, ManagerMode::Active)
    }
}

/// Mode for a given state of the world.
pub fn mode_for(
    settings: &Settings,
    permission: PermissionState,
    favorite_count: usize,
) -> ManagerMode {
    if !settings.notifications_enabled {
        ManagerMode::Idle(IdleReason::NotificationsDisabled)
    } else if permission != PermissionState::Granted {
        ManagerMode::Idle(IdleReason::PermissionNotGranted)
    } else if favorite_count == 0 {
        ManagerMode::Idle(IdleReason::NoFavorites)
    } else {
        ManagerMode::Active
    }
}

/// Transient in-app message shown alongside a platform notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub play_sound: bool,
}

pub struct NotificationManager<S, N> {
    source: S,
    notifier: N,
    favorites: Arc<FavoritesStore>,
    log: Arc<NotificationLog>,
    settings: Arc<SettingsStore>,
    poll_interval: Duration,
    icon_path: String,
    target_url: String,
    toasts: broadcast::Sender<Toast>,
}

impl<S: WeatherSource, N: PlatformNotifier> NotificationManager<S, N> {
    pub fn new(
        source: S,
        notifier: N,
        favorites: Arc<FavoritesStore>,
        log: Arc<NotificationLog>,
        settings: Arc<SettingsStore>,
        config: &AlertsConfig,
    ) -> Self {
        let (toasts, _) = broadcast::channel(TOAST_CHANNEL_CAPACITY);
        Self {
            source,
            notifier,
            favorites,
            log,
            settings,
            poll_interval: Duration::from_secs(u64::from(config.poll_interval_minutes.max(1)) * 60),
            icon_path: config.icon_path.clone(),
            target_url: config.target_url.clone(),
            toasts,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Mode from freshly read settings, favorites and live permission.
    pub fn mode(&self) -> ManagerMode {
        mode_for(
            &self.settings.get(),
            self.notifier.permission(),
            self.favorites.list().len(),
        )
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }

    /// Turn alerts on. Prompts for permission unless the platform already
    /// granted it; a denial (cached or live) is returned without prompting.
    /// Returns whether notifications ended up enabled.
    pub async fn enable_notifications(&self) -> Result<bool, AlertError> {
        if self.settings.notification_permission() == PermissionState::Denied {
            return Err(AlertError::PermissionDenied);
        }

        let state = match self.notifier.permission() {
            PermissionState::Prompt => self.notifier.request_permission().await,
            live => live,
        };
        self.settings.set_notification_permission(state)?;

        match state {
            PermissionState::Granted => {
                self.settings.set_notifications_enabled(true)?;
                tracing::info!("Severe-weather notifications enabled");
                Ok(true)
            }
            PermissionState::Denied => Err(AlertError::PermissionDenied),
            PermissionState::Prompt => Ok(false),
        }
    }

    pub fn disable_notifications(&self) -> Result<(), AlertError> {
        self.settings.set_notifications_enabled(false)?;
        tracing::info!("Severe-weather notifications disabled");
        Ok(())
    }

    /// Run one pass now, regardless of the timer. Returns the emitted alerts.
    pub async fn run_pass(&self) -> Vec<Alert> {
        self.pass(&CancellationToken::new()).await
    }

    /// Drive the Idle/Active state machine until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut settings_rx = self.settings.subscribe();
        let mut favorites_rx = self.favorites.subscribe();

        tracing::info!(
            "Notification manager started (poll interval {:?})",
            self.poll_interval
        );

        while !shutdown.is_cancelled() {
            self.refresh_persisted();
            match self.mode() {
                ManagerMode::Active => {
                    tracing::info!("Notification manager active");
                    self.run_active(&shutdown, &mut settings_rx, &mut favorites_rx)
                        .await;
                }
                ManagerMode::Idle(reason) => {
                    tracing::debug!("Notification manager idle: {:?}", reason);
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        _ = changed(&mut settings_rx) => {}
                        _ = changed(&mut favorites_rx) => {}
                        // Pick up edits made outside this process.
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!("Notification manager stopped");
    }

    /// Poll until shutdown or until the mode leaves Active. Dropping the
    /// interval on return cancels the pending tick.
    async fn run_active(
        &self,
        shutdown: &CancellationToken,
        settings_rx: &mut watch::Receiver<Settings>,
        favorites_rx: &mut watch::Receiver<Vec<FavoriteLocation>>,
    ) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => {
                    self.refresh_persisted();
                    if !self.mode().is_active() {
                        return;
                    }
                    self.pass(shutdown).await;
                }
                _ = changed(settings_rx) => {
                    if !self.mode().is_active() {
                        return;
                    }
                }
                _ = changed(favorites_rx) => {
                    if !self.mode().is_active() {
                        return;
                    }
                }
            }
        }
    }

    async fn pass(&self, cancel: &CancellationToken) -> Vec<Alert> {
        if let ManagerMode::Idle(reason) = self.mode() {
            tracing::debug!("Skipping pass: {:?}", reason);
            return Vec::new();
        }

        let favorites = self.favorites.list();
        let alerts = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Pass cancelled during fetch");
                return Vec::new();
            }
            alerts = self.collect(&favorites) => alerts,
        };

        if cancel.is_cancelled() {
            return Vec::new();
        }
        if let ManagerMode::Idle(reason) = self.mode() {
            tracing::info!(
                "Discarding {} alert(s), manager went idle ({:?})",
                alerts.len(),
                reason
            );
            return Vec::new();
        }

        let play_sound = self.settings.sound_enabled();
        for alert in &alerts {
            self.emit(alert, play_sound);
        }
        tracing::info!(
            "Pass checked {} favorite(s), {} alert(s)",
            favorites.len(),
            alerts.len()
        );
        alerts
    }

    /// Sequential fetch and evaluate. A failed fetch skips that favorite.
    async fn collect(&self, favorites: &[FavoriteLocation]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for favorite in favorites {
            let label = favorite.label();
            match self.source.fetch(favorite.lat, favorite.lon).await {
                Ok(snapshot) => alerts.extend(evaluate(&label, &snapshot)),
                Err(e) => tracing::warn!("Skipping {} this pass: {}", label, e),
            }
        }
        alerts
    }

    fn emit(&self, alert: &Alert, play_sound: bool) {
        let title = alert.title();
        let body = alert.body();

        let notification = PlatformNotification {
            title: title.clone(),
            body: body.clone(),
            icon: self.icon_path.clone(),
            target_url: self.target_url.clone(),
        };
        if let Err(e) = self.notifier.post(&notification) {
            tracing::warn!("Platform notification failed: {}", e);
        }

        let stored = StoredNotification::new(NotificationKind::Alert, title.clone(), body.clone())
            .with_location(alert.location_label.clone())
            .with_link(self.target_url.clone());
        if let Err(e) = self.log.push(stored) {
            tracing::warn!("Failed to record notification: {}", e);
        }

        // No subscribers is fine.
        let _ = self.toasts.send(Toast {
            title,
            body,
            play_sound,
        });
    }

    /// Publish edits made by other processes and sync the cached
    /// notification permission with the platform.
    fn refresh_persisted(&self) {
        self.settings.reload();
        self.favorites.reload();

        let live = self.notifier.permission();
        if self.settings.notification_permission() != live {
            if let Err(e) = self.settings.set_notification_permission(live) {
                tracing::warn!("Failed to cache notification permission: {}", e);
            }
        }
    }
}

// Resolves on the next published value. A closed channel never resolves.
async fn changed<T>(rx: &mut watch::Receiver<T>) {
    if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
    }
}
