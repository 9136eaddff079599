//! Live notification views: unread list with popup alerts, unread badge
//!
//! Two independent pollers. The unread list feeds a [`PopupTracker`]; a
//! strictly newer unread notification raises one popup, which dismisses
//! itself after a fixed delay regardless of later polls.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fyp_common::config::PollingConfig;
use fyp_common::events::{EventBus, PortalEvent};
use fyp_common::models::Notification;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{source_fn, LiveSource, PollHandle, Poller};
use crate::api::ApiClient;
use crate::coordinator::ViewCache;

/// Decides whether a poll result deserves a popup
///
/// Remembers the highest notification id already shown. Held in memory
/// only, so a fresh process pops the newest unread item once.
#[derive(Debug, Clone, Default)]
pub struct PopupTracker {
    last_seen: Option<i64>,
}

impl PopupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_last_seen(id: i64) -> Self {
        Self { last_seen: Some(id) }
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.last_seen
    }

    /// The notification to pop for this batch of unread items, if any
    ///
    /// Only the newest item (highest id) is considered, and only when it is
    /// strictly newer than anything seen before.
    pub fn observe<'a>(&mut self, unread: &'a [Notification]) -> Option<&'a Notification> {
        let newest = unread.iter().max_by_key(|n| n.id)?;
        let is_new = self.last_seen.map_or(true, |seen| newest.id > seen);
        if is_new {
            self.last_seen = Some(newest.id);
            Some(newest)
        } else {
            None
        }
    }
}

#[derive(Default)]
struct PopupState {
    tracker: PopupTracker,
    current: Option<Notification>,
}

struct Shared {
    popup: Mutex<PopupState>,
    count: Mutex<Option<u64>>,
    events: EventBus,
    dismiss_after: Duration,
    popups_enabled: bool,
    cancel: CancellationToken,
}

impl Shared {
    fn popup(&self) -> MutexGuard<'_, PopupState> {
        match self.popup.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn on_unread(self: &Arc<Self>, unread: &[Notification]) {
        if !self.popups_enabled {
            return;
        }
        let shown = {
            let mut state = self.popup();
            let Some(newest) = state.tracker.observe(unread).cloned() else {
                return;
            };
            state.current = Some(newest.clone());
            newest
        };

        info!(notification_id = shown.id, "New notification");
        self.events.emit_lossy(PortalEvent::NotificationPopup {
            notification_id: shown.id,
            title: shown.title.clone(),
            message: shown.message.clone(),
            timestamp: fyp_common::time::now(),
        });
        self.schedule_dismiss(shown.id);
    }

    fn schedule_dismiss(self: &Arc<Self>, notification_id: i64) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = shared.cancel.cancelled() => {}
                _ = tokio::time::sleep(shared.dismiss_after) => {
                    shared.dismiss(notification_id);
                }
            }
        });
    }

    /// Clear the popup if it still shows `notification_id`
    fn dismiss(&self, notification_id: i64) -> bool {
        let cleared = {
            let mut state = self.popup();
            match &state.current {
                Some(current) if current.id == notification_id => {
                    state.current = None;
                    true
                }
                _ => false,
            }
        };
        if cleared {
            debug!(notification_id, "Popup dismissed");
            self.events.emit_lossy(PortalEvent::PopupDismissed {
                notification_id,
                timestamp: fyp_common::time::now(),
            });
        }
        cleared
    }

    fn on_count(&self, count: u64) {
        let changed = {
            let mut current = match self.count.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let changed = *current != Some(count);
            *current = Some(count);
            changed
        };
        if changed {
            self.events.emit_lossy(PortalEvent::UnreadCountChanged {
                count,
                timestamp: fyp_common::time::now(),
            });
        }
    }
}

/// Mounted notification watcher for one user
///
/// Dropping it (or calling [`stop`](Self::stop)) tears both pollers and any
/// pending popup timer down.
pub struct NotificationWatcher {
    unread: ViewCache<Notification>,
    shared: Arc<Shared>,
    handles: Vec<PollHandle>,
}

impl NotificationWatcher {
    /// Watch `user_id` through the backend API
    ///
    /// Popups are raised only when `popups` is set (the portal shows them to
    /// students).
    pub fn start(
        api: Arc<ApiClient>,
        user_id: i64,
        polling: &PollingConfig,
        events: EventBus,
        popups: bool,
    ) -> Self {
        let unread = {
            let api = Arc::clone(&api);
            source_fn(move || {
                let api = Arc::clone(&api);
                async move { api.unread_notifications(user_id).await }
            })
        };
        let count = source_fn(move || {
            let api = Arc::clone(&api);
            async move { api.unread_count(user_id).await }
        });
        Self::with_sources(unread, count, polling, events, popups)
    }

    /// Watch arbitrary sources
    pub fn with_sources(
        unread_source: Arc<dyn LiveSource<Item = Vec<Notification>>>,
        count_source: Arc<dyn LiveSource<Item = u64>>,
        polling: &PollingConfig,
        events: EventBus,
        popups: bool,
    ) -> Self {
        let shared = Arc::new(Shared {
            popup: Mutex::new(PopupState::default()),
            count: Mutex::new(None),
            events,
            dismiss_after: polling.popup_dismiss(),
            popups_enabled: popups,
            cancel: CancellationToken::new(),
        });
        let unread = ViewCache::new("unread-notifications").with_source(Arc::clone(&unread_source));

        let list_handle = {
            let cache = unread.clone();
            let shared = Arc::clone(&shared);
            Poller::spawn(
                "unread-notifications",
                unread_source,
                polling.notifications(),
                move |fresh: Vec<Notification>| {
                    shared.on_unread(&fresh);
                    cache.reconcile(fresh);
                },
            )
        };
        let count_handle = {
            let shared = Arc::clone(&shared);
            Poller::spawn(
                "unread-count",
                count_source,
                polling.unread_count(),
                move |count: u64| shared.on_count(count),
            )
        };

        Self {
            unread,
            shared,
            handles: vec![list_handle, count_handle],
        }
    }

    /// Cached unread list (also the cache mutations go through)
    pub fn unread(&self) -> &ViewCache<Notification> {
        &self.unread
    }

    pub fn unread_count(&self) -> Option<u64> {
        match self.shared.count.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn current_popup(&self) -> Option<Notification> {
        self.shared.popup().current.clone()
    }

    pub fn last_seen(&self) -> Option<i64> {
        self.shared.popup().tracker.last_seen()
    }

    /// Close the popup by hand; returns whether one was showing
    pub fn dismiss_popup(&self) -> bool {
        let current = self.shared.popup().current.as_ref().map(|n| n.id);
        match current {
            Some(id) => self.shared.dismiss(id),
            None => false,
        }
    }

    /// Unmount: stop polling, cancel popup timers, drop late results
    pub fn stop(&mut self) {
        for handle in &mut self.handles {
            handle.stop();
        }
        self.shared.cancel.cancel();
        self.unread.close();
    }
}

impl Drop for NotificationWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
