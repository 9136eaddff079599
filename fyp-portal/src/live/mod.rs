//! Live data: polling behind a swappable source interface
//!
//! Views never talk to a timer directly. They hand a [`LiveSource`] and a
//! sink to a [`Poller`]; replacing polling with a push transport means
//! replacing the poller, not the views.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

pub mod chat;
pub mod notifications;
pub mod poller;

pub use chat::ChatTranscript;
pub use notifications::{NotificationWatcher, PopupTracker};
pub use poller::{PollHandle, Poller};

/// Something that can produce the current authoritative value of a view
#[async_trait]
pub trait LiveSource: Send + Sync + 'static {
    type Item: Send + 'static;

    async fn fetch(&self) -> Result<Self::Item>;
}

/// [`LiveSource`] backed by an async closure
pub struct FnSource<T, F> {
    fetch: F,
    _item: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F, Fut> LiveSource for FnSource<T, F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    type Item = T;

    async fn fetch(&self) -> Result<T> {
        (self.fetch)().await
    }
}

/// Wrap an async closure as a shared source
///
/// ```ignore
/// let api = Arc::clone(&api);
/// let source = source_fn(move || {
///     let api = Arc::clone(&api);
///     async move { api.unread_count(user_id).await }
/// });
/// ```
pub fn source_fn<T, F, Fut>(fetch: F) -> Arc<dyn LiveSource<Item = T>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Arc::new(FnSource {
        fetch,
        _item: PhantomData,
    })
}
