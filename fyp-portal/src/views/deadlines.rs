//! Deadlines view

use std::sync::Arc;

use chrono::Duration;
use fyp_common::models::{Deadline, Document, DocumentKind};
use fyp_common::stats::{deadline_rows, in_force_deadline, is_deadline_approaching, DeadlineRow};
use fyp_common::time::Clock;
use fyp_common::Role;
use tracing::{info, warn};

use super::require_role;
use crate::api::{ApiClient, NewDeadline};
use crate::coordinator::{Confirm, MutationCoordinator, ViewCache};
use crate::error::{PortalError, Result};
use crate::live::source_fn;

pub struct DeadlinesView {
    api: Arc<ApiClient>,
    coordinator: MutationCoordinator,
    clock: Arc<dyn Clock>,
    deadlines: ViewCache<Deadline>,
}

impl DeadlinesView {
    /// Active deadlines (the committee's management list loads all of them)
    pub fn new(
        api: Arc<ApiClient>,
        coordinator: MutationCoordinator,
        clock: Arc<dyn Clock>,
        include_inactive: bool,
    ) -> Self {
        let source = {
            let api = Arc::clone(&api);
            source_fn(move || {
                let api = Arc::clone(&api);
                async move {
                    if include_inactive {
                        api.all_deadlines().await
                    } else {
                        api.active_deadlines().await
                    }
                }
            })
        };
        Self {
            api,
            coordinator,
            clock,
            deadlines: ViewCache::new("deadlines").with_source(source),
        }
    }

    pub async fn load(&self) -> Result<()> {
        self.deadlines.refresh().await.map(|_| ())
    }

    pub fn items(&self) -> Vec<Deadline> {
        self.deadlines.items()
    }

    /// Per-deadline status rows for a student's documents
    pub fn rows(&self, documents: &[Document]) -> Vec<DeadlineRow> {
        deadline_rows(&self.deadlines.items(), documents, self.clock.now())
    }

    /// The deadline currently governing `kind`
    pub fn in_force(&self, kind: DocumentKind) -> Option<Deadline> {
        in_force_deadline(&self.deadlines.items(), kind).cloned()
    }

    /// Active deadlines falling due within `window`, soonest first
    pub fn approaching(&self, window: Duration) -> Vec<Deadline> {
        let now = self.clock.now();
        let mut due: Vec<Deadline> = self
            .deadlines
            .items()
            .into_iter()
            .filter(|d| is_deadline_approaching(d, now, window))
            .collect();
        due.sort_by_key(|d| d.due);
        due
    }

    /// Committee: set a new deadline
    pub async fn create(&self, deadline: &NewDeadline) -> Result<Deadline> {
        let user = self.api.session().require_user()?;
        require_role(&user, Role::FypCommittee, "set deadlines")?;
        if deadline.deadline_type.trim().is_empty() {
            return Err(PortalError::validation("Deadline type is required"));
        }
        if deadline.due <= self.clock.now() {
            return Err(PortalError::validation("Deadline must be in the future"));
        }

        let created = self.api.create_deadline(deadline, user.user_id).await?;
        info!(deadline_id = created.id, label = %created.deadline_type, "Deadline created");
        if let Err(e) = self.load().await {
            warn!("Refetch after deadline create failed: {}", e);
        }
        Ok(created)
    }

    /// Committee: stop a deadline from applying without deleting anything
    pub async fn deactivate(&self, deadline_id: i64) -> Result<()> {
        let user = self.api.session().require_user()?;
        require_role(&user, Role::FypCommittee, "deactivate deadlines")?;
        self.coordinator
            .mutate(
                &self.deadlines,
                "deactivate deadline",
                |items: &mut Vec<Deadline>| {
                    if let Some(d) = items.iter_mut().find(|d| d.id == deadline_id) {
                        d.is_active = false;
                    }
                },
                self.api.deactivate_deadline(deadline_id),
                |_, _| {},
            )
            .await
    }

    /// Committee: delete a deadline and, with it, every document filed under it
    pub async fn delete(&self, confirmer: &dyn Confirm, deadline_id: i64) -> Result<()> {
        let user = self.api.session().require_user()?;
        require_role(&user, Role::FypCommittee, "delete deadlines")?;
        let label = self
            .deadlines
            .find(|d| d.id == deadline_id)
            .map(|d| d.deadline_type)
            .unwrap_or_else(|| format!("deadline {}", deadline_id));
        let prompt = format!(
            "Delete \"{}\"? All documents submitted for it will be deleted too.",
            label
        );
        self.coordinator
            .mutate_destructive(
                confirmer,
                &prompt,
                &self.deadlines,
                "delete deadline",
                |items: &mut Vec<Deadline>| items.retain(|d| d.id != deadline_id),
                self.api.delete_deadline(deadline_id),
                |_, _| {},
            )
            .await
    }
}
