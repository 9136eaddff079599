//! fyp-portal library - document review and grading client
//!
//! Talks to the FYP backend over REST. Local state lives in per-view caches
//! that only change through optimistic mutations or authoritative refetches;
//! live views (notifications, chat) are kept fresh by pollers.

use std::sync::Arc;

use fyp_common::config::PortalConfig;
use fyp_common::events::EventBus;
use fyp_common::time::{Clock, SystemClock};
use tracing::info;

pub mod api;
pub mod coordinator;
pub mod error;
pub mod live;
pub mod session;
pub mod views;

pub use api::ApiClient;
pub use coordinator::{Confirm, MutationCoordinator, Reconcile, ViewCache};
pub use error::{PortalError, Result};
pub use session::{CredentialStore, FileStore, MemoryStore, Session, SessionContext};

use views::{DeadlinesView, DocumentScope, DocumentsView, GradesView, NotificationsView};

/// Capacity of the portal event bus
const EVENT_CAPACITY: usize = 256;

/// Everything a front-end needs, wired once per process
#[derive(Clone)]
pub struct Portal {
    pub config: PortalConfig,
    pub events: EventBus,
    pub session: Arc<SessionContext>,
    pub api: Arc<ApiClient>,
    pub coordinator: MutationCoordinator,
    pub clock: Arc<dyn Clock>,
}

impl Portal {
    /// Hydrate the session and build the API client
    pub fn init(config: PortalConfig) -> Result<Self> {
        let store: Box<dyn CredentialStore> = match &config.session_file {
            Some(path) => {
                info!("Session file: {}", path.display());
                Box::new(FileStore::new(path.clone()))
            }
            None => Box::new(MemoryStore),
        };
        Self::with_store(config, store, Arc::new(SystemClock))
    }

    pub fn with_store(
        config: PortalConfig,
        store: Box<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let events = EventBus::new(EVENT_CAPACITY);
        let session = Arc::new(SessionContext::hydrate(store, events.clone())?);
        let api = Arc::new(ApiClient::from_config(&config, Arc::clone(&session))?);
        Ok(Self {
            coordinator: MutationCoordinator::new(events.clone()),
            config,
            events,
            session,
            api,
            clock,
        })
    }

    /// Documents listed the way the signed-in user's role sees them
    pub fn documents(&self) -> Result<DocumentsView> {
        let user = self.session.require_user()?;
        Ok(self.documents_in(DocumentScope::for_user(&user)))
    }

    pub fn documents_in(&self, scope: DocumentScope) -> DocumentsView {
        DocumentsView::new(
            Arc::clone(&self.api),
            self.coordinator.clone(),
            Arc::clone(&self.clock),
            scope,
        )
    }

    pub fn notifications(&self, unread_only: bool) -> Result<NotificationsView> {
        let user = self.session.require_user()?;
        Ok(NotificationsView::new(
            Arc::clone(&self.api),
            self.coordinator.clone(),
            user.user_id,
            unread_only,
        ))
    }

    pub fn grades(&self) -> GradesView {
        GradesView::new(
            Arc::clone(&self.api),
            self.coordinator.clone(),
            self.config.gpa_table.clone(),
        )
    }

    pub fn deadlines(&self, include_inactive: bool) -> DeadlinesView {
        DeadlinesView::new(
            Arc::clone(&self.api),
            self.coordinator.clone(),
            Arc::clone(&self.clock),
            include_inactive,
        )
    }
}
