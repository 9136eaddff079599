//! Optimistic mutation coordinator
//!
//! A [`ViewCache`] is the client's local copy of one view's collection. It is
//! written in exactly two ways:
//!
//! - by a mutation, through [`MutationCoordinator::mutate`]: snapshot, apply
//!   locally, await the remote call, then confirm or restore the snapshot;
//! - by a reconcile with authoritative data (a poll or a post-mutation
//!   refetch), through [`ViewCache::reconcile`].
//!
//! Mutations on one cache are serialized. A reconcile that arrives while a
//! mutation is in flight is deferred and replaced by a fresh fetch once the
//! mutation settles, so the snapshot restored on failure is always exactly
//! what the user saw before acting.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use fyp_common::events::{EventBus, PortalEvent};
use tracing::{debug, info, warn};

use crate::error::{PortalError, Result};
use crate::live::LiveSource;

/// Outcome of handing authoritative data to a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Applied,
    /// A mutation is in flight; a refetch follows when it settles
    Deferred,
    /// The view has been closed; the data was dropped
    Discarded,
}

struct CacheState<T> {
    items: Vec<T>,
    in_flight: bool,
    refetch_pending: bool,
    closed: bool,
}

/// Local cache of one view's collection
pub struct ViewCache<T> {
    name: Arc<str>,
    state: Arc<Mutex<CacheState<T>>>,
    writer: Arc<tokio::sync::Mutex<()>>,
    source: Option<Arc<dyn LiveSource<Item = Vec<T>>>>,
}

impl<T> Clone for ViewCache<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
            writer: Arc::clone(&self.writer),
            source: self.source.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> ViewCache<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(CacheState {
                items: Vec::new(),
                in_flight: false,
                refetch_pending: false,
                closed: false,
            })),
            writer: Arc::new(tokio::sync::Mutex::new(())),
            source: None,
        }
    }

    /// Attach the authoritative source used for refetches
    pub fn with_source(mut self, source: Arc<dyn LiveSource<Item = Vec<T>>>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.lock().items.iter().find(|item| pred(item)).cloned()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Tear the view down; later reconciles are discarded
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Replace the contents with authoritative data
    pub fn reconcile(&self, fresh: Vec<T>) -> Reconcile {
        let mut state = self.lock();
        if state.closed {
            return Reconcile::Discarded;
        }
        if state.in_flight {
            state.refetch_pending = true;
            debug!(view = %self.name, "Reconcile deferred behind in-flight mutation");
            return Reconcile::Deferred;
        }
        state.items = fresh;
        Reconcile::Applied
    }

    /// Fetch from the attached source and reconcile
    pub async fn refresh(&self) -> Result<Reconcile> {
        let Some(source) = self.source.clone() else {
            return Err(PortalError::Config(format!("view '{}' has no source", self.name)));
        };
        let fresh = source.fetch().await?;
        Ok(self.reconcile(fresh))
    }

    /// Refetch in the background; failures are logged
    fn spawn_refresh(&self) {
        if self.source.is_none() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let cache = self.clone();
        runtime.spawn(async move {
            if let Err(e) = cache.refresh().await {
                warn!(view = %cache.name, "Refetch after mutation failed: {}", e);
            }
        });
    }

    fn begin(&self, apply: impl FnOnce(&mut Vec<T>)) -> InFlight<'_, T> {
        let mut state = self.lock();
        let snapshot = state.items.clone();
        apply(&mut state.items);
        state.in_flight = true;
        InFlight {
            cache: self,
            snapshot,
            armed: true,
        }
    }

    /// Returns whether a reconcile was deferred during the mutation
    fn settle(&self, finish: impl FnOnce(&mut Vec<T>)) -> bool {
        let mut state = self.lock();
        finish(&mut state.items);
        state.in_flight = false;
        std::mem::take(&mut state.refetch_pending)
    }
}

/// An applied but unconfirmed change
///
/// Dropping it before [`confirm`](Self::confirm) or
/// [`roll_back`](Self::roll_back) (the mutation future was cancelled)
/// restores the snapshot and clears the in-flight flag.
struct InFlight<'a, T: Clone + Send + 'static> {
    cache: &'a ViewCache<T>,
    snapshot: Vec<T>,
    armed: bool,
}

impl<T: Clone + Send + 'static> InFlight<'_, T> {
    fn confirm(mut self, finish: impl FnOnce(&mut Vec<T>)) {
        self.armed = false;
        self.cache.settle(finish);
    }

    /// Returns whether a reconcile was deferred during the mutation
    fn roll_back(mut self) -> bool {
        self.armed = false;
        let snapshot = std::mem::take(&mut self.snapshot);
        self.cache.settle(move |items| *items = snapshot)
    }
}

impl<T: Clone + Send + 'static> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let snapshot = std::mem::take(&mut self.snapshot);
        let deferred = self.cache.settle(move |items| *items = snapshot);
        warn!(view = %self.cache.name(), "Mutation abandoned before it settled, rolled back");
        if deferred {
            self.cache.spawn_refresh();
        }
    }
}

/// Asks the user to confirm a destructive action
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Runs the snapshot / apply / call / reconcile protocol
#[derive(Clone)]
pub struct MutationCoordinator {
    events: EventBus,
}

impl MutationCoordinator {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Apply `apply` locally, await `remote`, then confirm or roll back
    ///
    /// `remote` is not polled until after the local apply. On success
    /// `confirm` folds the response into the cache and a refetch is started
    /// in the background. On failure the pre-mutation snapshot is restored
    /// exactly and the error returned; nothing is retried.
    pub async fn mutate<T, R, A, C, Fut>(
        &self,
        cache: &ViewCache<T>,
        label: &str,
        apply: A,
        remote: Fut,
        confirm: C,
    ) -> Result<R>
    where
        T: Clone + Send + 'static,
        A: FnOnce(&mut Vec<T>),
        C: FnOnce(&mut Vec<T>, &R),
        Fut: Future<Output = Result<R>>,
    {
        let _writer = cache.writer.lock().await;
        let pending = cache.begin(apply);
        debug!(view = %cache.name(), label, "Optimistic change applied");

        match remote.await {
            Ok(value) => {
                pending.confirm(|items| confirm(items, &value));
                info!(view = %cache.name(), label, "Mutation confirmed");
                self.events.emit_lossy(PortalEvent::MutationConfirmed {
                    label: label.to_string(),
                    timestamp: fyp_common::time::now(),
                });
                cache.spawn_refresh();
                Ok(value)
            }
            Err(err) => {
                let deferred = pending.roll_back();
                warn!(
                    view = %cache.name(),
                    label,
                    kind = err.kind(),
                    "Mutation failed, rolled back: {}",
                    err
                );
                self.events.emit_lossy(PortalEvent::MutationRolledBack {
                    label: label.to_string(),
                    kind: err.kind().to_string(),
                    message: err.user_message(),
                    timestamp: fyp_common::time::now(),
                });
                if deferred {
                    cache.spawn_refresh();
                }
                Err(err)
            }
        }
    }

    /// [`mutate`](Self::mutate) behind an explicit confirmation step
    ///
    /// A declined prompt returns `Declined` before anything is touched.
    pub async fn mutate_destructive<T, R, A, C, Fut>(
        &self,
        confirmer: &dyn Confirm,
        prompt: &str,
        cache: &ViewCache<T>,
        label: &str,
        apply: A,
        remote: Fut,
        confirm: C,
    ) -> Result<R>
    where
        T: Clone + Send + 'static,
        A: FnOnce(&mut Vec<T>),
        C: FnOnce(&mut Vec<T>, &R),
        Fut: Future<Output = Result<R>>,
    {
        if !confirmer.confirm(prompt) {
            info!(label, "Destructive action declined");
            return Err(PortalError::Declined(label.to_string()));
        }
        self.mutate(cache, label, apply, remote, confirm).await
    }
}
