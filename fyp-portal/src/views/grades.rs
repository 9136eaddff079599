//! Grades view: evaluator scoring, committee release, student DMC

use std::sync::{Arc, Mutex};

use fyp_common::grading::{has_graded_all_criteria, DocumentGradeSummary, GpaTable, MarksCertificate};
use fyp_common::models::{Document, Grade, NewGrade};
use fyp_common::Role;
use futures::future::try_join_all;
use tracing::{info, warn};

use super::require_role;
use crate::api::ApiClient;
use crate::coordinator::{MutationCoordinator, ViewCache};
use crate::error::{PortalError, Result};
use crate::live::source_fn;

pub struct GradesView {
    api: Arc<ApiClient>,
    coordinator: MutationCoordinator,
    gpa_table: GpaTable,
    /// Document whose criteria the cache holds
    document: Arc<Mutex<Option<i64>>>,
    grades: ViewCache<Grade>,
}

impl GradesView {
    pub fn new(api: Arc<ApiClient>, coordinator: MutationCoordinator, gpa_table: GpaTable) -> Self {
        let document = Arc::new(Mutex::new(None::<i64>));
        let source = {
            let api = Arc::clone(&api);
            let document = Arc::clone(&document);
            source_fn(move || {
                let api = Arc::clone(&api);
                let current = *document.lock().unwrap_or_else(|p| p.into_inner());
                async move {
                    match current {
                        Some(document_id) => api.document_grades(document_id).await,
                        None => Ok(Vec::new()),
                    }
                }
            })
        };
        Self {
            api,
            coordinator,
            gpa_table,
            document,
            grades: ViewCache::new("grades").with_source(source),
        }
    }

    pub fn items(&self) -> Vec<Grade> {
        self.grades.items()
    }

    pub fn gpa_table(&self) -> &GpaTable {
        &self.gpa_table
    }

    /// Load every criterion of one document (evaluator/committee view)
    pub async fn load_document(&self, document_id: i64) -> Result<()> {
        *self.document.lock().unwrap_or_else(|p| p.into_inner()) = Some(document_id);
        self.grades.refresh().await.map(|_| ())
    }

    /// Reload after a write the backend already accepted
    async fn reload_after_write(&self, document_id: i64) {
        if let Err(e) = self.load_document(document_id).await {
            warn!(document_id, "Refetch after grading failed: {}", e);
        }
    }

    /// Summary over the loaded grades of `document`, released criteria only
    pub fn summary(&self, document: &Document) -> Option<DocumentGradeSummary> {
        DocumentGradeSummary::released(document, &self.grades.items(), &self.gpa_table)
    }

    /// Evaluator: score one rubric criterion
    pub async fn grade(&self, grade: &NewGrade) -> Result<Grade> {
        let user = self.api.session().require_user()?;
        require_role(&user, Role::Evaluator, "grade documents")?;
        let stored = self.api.create_grade(grade, user.user_id).await?;
        info!(
            document_id = grade.document_id,
            criterion = %grade.rubric_criteria,
            "Criterion graded"
        );
        self.reload_after_write(grade.document_id).await;
        Ok(stored)
    }

    /// Evaluator: correct a score the student cannot see yet
    pub async fn correct(&self, grade_id: i64, grade: &NewGrade) -> Result<Grade> {
        let user = self.api.session().require_user()?;
        require_role(&user, Role::Evaluator, "grade documents")?;
        let current = self
            .grades
            .items()
            .into_iter()
            .find(|g| g.id == grade_id)
            .ok_or_else(|| PortalError::NotFound(format!("Grade {} is not loaded", grade_id)))?;
        if current.is_released {
            return Err(PortalError::IllegalTransition(
                "Released grades can no longer be corrected".to_string(),
            ));
        }
        let stored = self.api.update_grade(grade_id, grade).await?;
        info!(grade_id, score = grade.score, "Criterion score corrected");
        self.reload_after_write(current.document_id).await;
        Ok(stored)
    }

    /// Has the signed-in evaluator scored every criterion of `document_id`?
    pub fn is_grading_complete(&self, document_id: i64) -> Result<bool> {
        let user = self.api.session().require_user()?;
        Ok(has_graded_all_criteria(
            &self.grades.items(),
            document_id,
            user.user_id,
        ))
    }

    /// Committee: release all of a document's grades to the student
    pub async fn release_all(&self, document_id: i64) -> Result<()> {
        let user = self.api.session().require_user()?;
        require_role(&user, Role::FypCommittee, "release grades")?;
        let now = fyp_common::time::now().naive_utc();
        self.coordinator
            .mutate(
                &self.grades,
                "release grades",
                |grades: &mut Vec<Grade>| {
                    for grade in grades.iter_mut().filter(|g| g.document_id == document_id) {
                        grade.is_released = true;
                        if grade.released_at.is_none() {
                            grade.released_at = Some(now);
                        }
                    }
                },
                self.api.release_all_grades(document_id),
                |_, _| {},
            )
            .await?;
        info!(document_id, "Grades released");
        Ok(())
    }

    /// Detailed Marks Certificate for `student_id` from released grades
    pub async fn marks_certificate(&self, student_id: i64) -> Result<MarksCertificate> {
        let documents = self.api.student_documents(student_id).await?;
        let per_document = try_join_all(
            documents
                .iter()
                .map(|doc| self.api.released_document_grades(doc.id)),
        )
        .await?;
        let grades: Vec<Grade> = per_document.into_iter().flatten().collect();
        Ok(MarksCertificate::build(&documents, &grades, &self.gpa_table))
    }
}
