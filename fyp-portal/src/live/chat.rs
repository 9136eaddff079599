//! Live group chat transcript
//!
//! Polls the selected group's messages. Selecting another group stops the
//! old poller before the new one starts, so a late reply for the previous
//! group never lands in the new transcript.

use std::sync::Arc;
use std::time::Duration;

use fyp_common::events::{EventBus, PortalEvent};
use fyp_common::models::ChatMessage;
use tracing::{debug, info, warn};

use super::{source_fn, LiveSource, PollHandle, Poller};
use crate::api::ApiClient;
use crate::coordinator::{Reconcile, ViewCache};
use crate::error::{PortalError, Result};

/// Builds the message source for a group
pub type GroupSources =
    Arc<dyn Fn(i64) -> Arc<dyn LiveSource<Item = Vec<ChatMessage>>> + Send + Sync>;

pub struct ChatTranscript {
    sources: GroupSources,
    every: Duration,
    events: EventBus,
    group: Option<i64>,
    messages: ViewCache<ChatMessage>,
    handle: Option<PollHandle>,
}

impl ChatTranscript {
    pub fn new(sources: GroupSources, every: Duration, events: EventBus) -> Self {
        let messages = ViewCache::new("chat");
        messages.close();
        Self {
            sources,
            every,
            events,
            group: None,
            messages,
            handle: None,
        }
    }

    /// Transcript fed by the backend's group endpoint
    pub fn for_api(api: Arc<ApiClient>, every: Duration, events: EventBus) -> Self {
        let sources: GroupSources = Arc::new(move |group_id| {
            let api = Arc::clone(&api);
            source_fn(move || {
                let api = Arc::clone(&api);
                async move { api.group_messages(group_id).await }
            })
        });
        Self::new(sources, every, events)
    }

    pub fn group(&self) -> Option<i64> {
        self.group
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.items()
    }

    /// Switch the transcript to `group_id` and fetch it right away
    pub fn select_group(&mut self, group_id: i64) {
        if self.group == Some(group_id) && self.handle.is_some() {
            return;
        }
        self.unmount();

        let source = (self.sources)(group_id);
        let messages = ViewCache::new("chat").with_source(Arc::clone(&source));
        let handle = {
            let cache = messages.clone();
            let events = self.events.clone();
            Poller::spawn("chat", source, self.every, move |fresh: Vec<ChatMessage>| {
                let before = cache.len();
                let count = fresh.len();
                if cache.reconcile(fresh) == Reconcile::Applied && count != before {
                    events.emit_lossy(PortalEvent::ChatUpdated {
                        group_id,
                        message_count: count,
                        timestamp: fyp_common::time::now(),
                    });
                }
            })
        };

        info!(group_id, "Watching chat group");
        self.group = Some(group_id);
        self.messages = messages;
        self.handle = Some(handle);
    }

    /// Fetch the current group now instead of waiting for the next tick
    pub async fn refresh(&self) -> Result<()> {
        if self.group.is_none() {
            return Err(PortalError::validation("No chat group selected"));
        }
        self.messages.refresh().await.map(|_| ())
    }

    /// Send to the current group, then refetch the transcript
    pub async fn send(&self, api: &ApiClient, sender_id: i64, content: &str) -> Result<ChatMessage> {
        let Some(group_id) = self.group else {
            return Err(PortalError::validation("No chat group selected"));
        };
        let sent = api.send_chat_message(group_id, sender_id, content).await?;
        debug!(group_id, message_id = sent.id, "Chat message sent");
        if let Err(e) = self.refresh().await {
            warn!(group_id, "Refetch after send failed: {}", e);
        }
        Ok(sent)
    }

    fn unmount(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        self.messages.close();
    }

    pub fn close(&mut self) {
        self.unmount();
        self.group = None;
    }
}

impl Drop for ChatTranscript {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fyp_common::models::ChatSender;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::sleep;

    fn message(id: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            sender: Some(ChatSender {
                id: 3,
                full_name: Some("Sara".to_string()),
            }),
            content: content.to_string(),
            sent_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    /// Per-group fixed transcripts; group 99 answers slowly
    fn sources(calls: Arc<Mutex<HashMap<i64, usize>>>) -> GroupSources {
        Arc::new(move |group_id| {
            let calls = Arc::clone(&calls);
            source_fn(move || {
                *calls.lock().unwrap().entry(group_id).or_insert(0) += 1;
                async move {
                    if group_id == 99 {
                        sleep(Duration::from_secs(5)).await;
                    }
                    Ok(vec![message(group_id * 10, &format!("hello group {}", group_id))])
                }
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_group_fetches_immediately() {
        let calls = Arc::new(Mutex::new(HashMap::new()));
        let mut chat = ChatTranscript::new(
            sources(Arc::clone(&calls)),
            Duration::from_secs(3),
            EventBus::new(16),
        );
        chat.select_group(1);

        while chat.messages().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(chat.messages()[0].content, "hello group 1");
        assert_eq!(chat.group(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_group_drops_late_reply() {
        let calls = Arc::new(Mutex::new(HashMap::new()));
        let mut chat = ChatTranscript::new(
            sources(Arc::clone(&calls)),
            Duration::from_secs(3),
            EventBus::new(16),
        );

        // Group 99 is slow; switch away while its first fetch is in flight
        chat.select_group(99);
        sleep(Duration::from_secs(1)).await;
        chat.select_group(2);
        sleep(Duration::from_secs(10)).await;

        let messages = chat.messages();
        assert!(!messages.is_empty());
        assert!(messages.iter().all(|m| m.content == "hello group 2"));
        assert_eq!(calls.lock().unwrap().get(&99), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_interval() {
        let calls = Arc::new(Mutex::new(HashMap::new()));
        let mut chat = ChatTranscript::new(
            sources(Arc::clone(&calls)),
            Duration::from_secs(3),
            EventBus::new(16),
        );
        chat.select_group(4);
        sleep(Duration::from_millis(9500)).await;

        // t = 0, 3, 6, 9
        assert_eq!(calls.lock().unwrap().get(&4), Some(&4));
    }

    #[tokio::test]
    async fn test_refresh_without_group_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let sources: GroupSources = {
            let counter = Arc::clone(&counter);
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                source_fn(|| async { Ok(Vec::new()) })
            })
        };
        let chat = ChatTranscript::new(sources, Duration::from_secs(3), EventBus::new(4));
        assert!(matches!(
            chat.refresh().await,
            Err(PortalError::ValidationFailure { .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
