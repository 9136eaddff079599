//! Document workflow view
//!
//! Every lifecycle action follows the same path: re-read the document,
//! refuse if it moved since the cache last saw it, evaluate the transition
//! locally, then run the change through the mutation coordinator.

use std::sync::Arc;

use fyp_common::events::PortalEvent;
use fyp_common::models::{
    Document, DocumentKind, DocumentVersion, NewReview, Review, UserProfile,
};
use fyp_common::stats::{latest_review, next_review_round, pending_for, DashboardStats};
use fyp_common::time::Clock;
use fyp_common::transition::{evaluate_document, evaluate_fresh};
use fyp_common::{Action, DocumentStatus, ReviewDecision, ReviewStage, Role};
use futures::future::try_join;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiClient, FileUpload};
use crate::coordinator::{MutationCoordinator, ViewCache};
use crate::error::{PortalError, Result};
use crate::live::source_fn;

/// Which documents a view lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentScope {
    Student(i64),
    Supervisor(i64),
    Submitted,
    Status(DocumentStatus),
}

impl DocumentScope {
    /// The listing each role works from
    pub fn for_user(user: &UserProfile) -> Self {
        match user.role {
            Role::Student => DocumentScope::Student(user.user_id),
            Role::Supervisor => DocumentScope::Supervisor(user.user_id),
            Role::Evaluator | Role::FypCommittee => DocumentScope::Submitted,
        }
    }

    async fn fetch(self, api: &ApiClient) -> Result<Vec<Document>> {
        match self {
            DocumentScope::Student(id) => api.student_documents(id).await,
            DocumentScope::Supervisor(id) => api.supervisor_documents(id).await,
            DocumentScope::Submitted => api.submitted_documents().await,
            DocumentScope::Status(status) => api.documents_by_status(status).await,
        }
    }
}

/// Review history and uploaded versions of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFeedback {
    pub document_id: i64,
    /// Oldest first
    pub reviews: Vec<Review>,
    pub versions: Vec<DocumentVersion>,
    pub latest: Option<Review>,
}

/// Checked transition, ready to apply
struct Planned {
    user: UserProfile,
    from: DocumentStatus,
    to: DocumentStatus,
}

pub struct DocumentsView {
    api: Arc<ApiClient>,
    coordinator: MutationCoordinator,
    clock: Arc<dyn Clock>,
    scope: DocumentScope,
    documents: ViewCache<Document>,
}

impl DocumentsView {
    pub fn new(
        api: Arc<ApiClient>,
        coordinator: MutationCoordinator,
        clock: Arc<dyn Clock>,
        scope: DocumentScope,
    ) -> Self {
        let source = {
            let api = Arc::clone(&api);
            source_fn(move || {
                let api = Arc::clone(&api);
                async move { scope.fetch(&api).await }
            })
        };
        Self {
            api,
            coordinator,
            clock,
            scope,
            documents: ViewCache::new("documents").with_source(source),
        }
    }

    pub fn scope(&self) -> DocumentScope {
        self.scope
    }

    pub fn cache(&self) -> &ViewCache<Document> {
        &self.documents
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.items()
    }

    pub fn document(&self, document_id: i64) -> Option<Document> {
        self.documents.find(|d| d.id == document_id)
    }

    pub async fn load(&self) -> Result<()> {
        self.documents.refresh().await.map(|_| ())
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_documents(&self.documents.items())
    }

    /// Documents waiting on `role`
    pub fn pending(&self, role: Role) -> Vec<Document> {
        let documents = self.documents.items();
        pending_for(&documents, role).into_iter().cloned().collect()
    }

    /// Reviews and versions of `document_id`, for the feedback timeline
    pub async fn feedback(&self, document_id: i64) -> Result<DocumentFeedback> {
        let (mut reviews, versions) = try_join(
            self.api.document_reviews(document_id),
            self.api.document_versions(document_id),
        )
        .await?;
        reviews.sort_by_key(|r| (r.reviewed_at, r.id));
        let latest = latest_review(&reviews, document_id).cloned();
        Ok(DocumentFeedback {
            document_id,
            reviews,
            versions,
            latest,
        })
    }

    /// Re-read `document_id` and evaluate `action` against it
    async fn plan(&self, document_id: i64, action: Action) -> Result<Planned> {
        let user = self.api.session().require_user()?;
        let cached = self
            .document(document_id)
            .ok_or_else(|| PortalError::NotFound(format!("document {} is not loaded", document_id)))?;

        let fresh = self.api.get_document(document_id).await?;
        if let Err(e) = evaluate_fresh(cached.status, fresh.status, user.role, action) {
            warn!(document_id, action = %action, "Refusing action: {}", e);
            return Err(e.into());
        }
        let to = evaluate_document(&fresh, user.role, action, self.clock.now())?;
        Ok(Planned {
            user,
            from: fresh.status,
            to,
        })
    }

    /// Optimistically move `document_id` to the planned status around `remote`
    async fn transition<Fut>(
        &self,
        document_id: i64,
        label: &str,
        plan: &Planned,
        remote: Fut,
    ) -> Result<Document>
    where
        Fut: std::future::Future<Output = Result<Document>>,
    {
        let to = plan.to;
        let document = self
            .coordinator
            .mutate(
                &self.documents,
                label,
                |docs: &mut Vec<Document>| {
                    if let Some(doc) = docs.iter_mut().find(|d| d.id == document_id) {
                        doc.set_status(to);
                    }
                },
                remote,
                replace_document,
            )
            .await?;
        self.announce(document_id, plan, document.status);
        Ok(document)
    }

    fn announce(&self, document_id: i64, plan: &Planned, settled: DocumentStatus) {
        if settled != plan.to {
            warn!(
                document_id,
                expected = %plan.to,
                actual = %settled,
                "Backend settled on a different status"
            );
        }
        info!(document_id, from = %plan.from, to = %settled, "Document status changed");
        self.coordinator.events().emit_lossy(PortalEvent::DocumentStatusChanged {
            document_id,
            from: plan.from,
            to: settled,
            timestamp: fyp_common::time::now(),
        });
    }

    /// Student: submit a draft or a revised document
    pub async fn submit(&self, document_id: i64) -> Result<Document> {
        let plan = self.plan(document_id, Action::Submit).await?;
        self.transition(
            document_id,
            "submit document",
            &plan,
            self.api.submit_document(document_id),
        )
        .await
    }

    /// Reviewer: pick up a document awaiting the reviewer's stage
    pub async fn begin_review(&self, document_id: i64) -> Result<Document> {
        let plan = self.plan(document_id, Action::BeginReview).await?;
        self.transition(
            document_id,
            "begin review",
            &plan,
            self.api.update_document_status(document_id, plan.to),
        )
        .await
    }

    /// Committee: final sign-off after committee approval
    pub async fn finalize(&self, document_id: i64) -> Result<Document> {
        let plan = self.plan(document_id, Action::Finalize).await?;
        self.transition(
            document_id,
            "finalize document",
            &plan,
            self.api.update_document_status(document_id, plan.to),
        )
        .await
    }

    /// Reviewer: record a decision for the reviewer's stage
    ///
    /// The backend moves the document when the review is stored; the
    /// document is then re-read to confirm the new status.
    pub async fn review(
        &self,
        document_id: i64,
        decision: ReviewDecision,
        comments: &str,
    ) -> Result<Review> {
        if comments.trim().is_empty() {
            return Err(PortalError::validation("Review comments are required"));
        }
        let plan = self.plan(document_id, decision.action()).await?;
        let stage = ReviewStage::for_reviewer(plan.user.role).ok_or_else(|| {
            PortalError::UnauthorizedActor(format!("{} does not review documents", plan.user.role))
        })?;

        let prior = self.api.document_reviews(document_id).await?;
        let review = NewReview {
            document_id,
            comments: comments.trim().to_string(),
            decision,
            review_round: next_review_round(&prior, document_id, stage),
        };

        let to = plan.to;
        let recorded = self
            .coordinator
            .mutate(
                &self.documents,
                "review document",
                |docs: &mut Vec<Document>| {
                    if let Some(doc) = docs.iter_mut().find(|d| d.id == document_id) {
                        doc.set_status(to);
                    }
                },
                self.api.create_review(&review, plan.user.user_id),
                |_, _| {},
            )
            .await?;

        // The review is stored; a failed re-read only loses the confirmation
        let settled = match self.api.get_document(document_id).await {
            Ok(document) => document.status,
            Err(e) => {
                warn!(document_id, "Re-read after review failed: {}", e);
                plan.to
            }
        };
        self.announce(document_id, &plan, settled);
        Ok(recorded)
    }

    /// Student: upload a new file version of an editable document
    pub async fn upload_version(
        &self,
        document_id: i64,
        file: FileUpload,
        change_description: Option<&str>,
    ) -> Result<Document> {
        let plan = self.plan(document_id, Action::UploadVersion).await?;
        let document = self
            .coordinator
            .mutate(
                &self.documents,
                "upload version",
                |docs: &mut Vec<Document>| {
                    if let Some(doc) = docs.iter_mut().find(|d| d.id == document_id) {
                        doc.version += 1;
                    }
                },
                self.api.upload_version(document_id, file, change_description),
                replace_document,
            )
            .await?;
        info!(
            document_id,
            version = document.version,
            status = %plan.to,
            "New version uploaded"
        );
        Ok(document)
    }

    /// Student: first upload for a deliverable
    pub async fn create(
        &self,
        kind: DocumentKind,
        title: &str,
        description: Option<&str>,
        file: FileUpload,
    ) -> Result<Document> {
        let user = self.api.session().require_user()?;
        if !user.role.permits(Action::UploadVersion) {
            return Err(PortalError::UnauthorizedActor(format!(
                "{} is not permitted to upload documents",
                user.role
            )));
        }
        if title.trim().is_empty() {
            return Err(PortalError::validation("Title is required"));
        }
        if let Some(existing) = self.documents.find(|d| d.kind == Some(kind)) {
            return Err(PortalError::IllegalTransition(format!(
                "a {} already exists (document {}); upload a new version instead",
                kind.label(),
                existing.id
            )));
        }

        let document = self
            .api
            .create_document(user.user_id, kind, title.trim(), description, file)
            .await?;
        info!(document_id = document.id, kind = kind.as_str(), "Document created");
        if let Err(e) = self.load().await {
            warn!("Refetch after create failed: {}", e);
        }
        Ok(document)
    }
}

fn replace_document(docs: &mut Vec<Document>, confirmed: &Document) {
    if let Some(doc) = docs.iter_mut().find(|d| d.id == confirmed.id) {
        *doc = confirmed.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> UserProfile {
        UserProfile {
            user_id: 12,
            email: "user@uni.edu".to_string(),
            full_name: "Test User".to_string(),
            role,
        }
    }

    #[test]
    fn test_scope_follows_role() {
        assert_eq!(DocumentScope::for_user(&user(Role::Student)), DocumentScope::Student(12));
        assert_eq!(
            DocumentScope::for_user(&user(Role::Supervisor)),
            DocumentScope::Supervisor(12)
        );
        assert_eq!(DocumentScope::for_user(&user(Role::Evaluator)), DocumentScope::Submitted);
        assert_eq!(DocumentScope::for_user(&user(Role::FypCommittee)), DocumentScope::Submitted);
    }
}
