//! Grade endpoints

use fyp_common::models::{Grade, NewGrade};
use reqwest::Method;

use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Score one rubric criterion; out-of-range scores never leave the client
    pub async fn create_grade(&self, grade: &NewGrade, evaluator_id: i64) -> Result<Grade> {
        grade.validate()?;
        let request = self
            .authorized(Method::POST, "/grades")?
            .query(&[("evaluatorId", evaluator_id)])
            .json(grade);
        self.json(request).await
    }

    pub async fn update_grade(&self, grade_id: i64, grade: &NewGrade) -> Result<Grade> {
        grade.validate()?;
        let request = self
            .authorized(Method::PUT, &format!("/grades/{}", grade_id))?
            .json(grade);
        self.json(request).await
    }

    /// Release every criterion of a document in one call
    pub async fn release_all_grades(&self, document_id: i64) -> Result<()> {
        let request = self.authorized(
            Method::PATCH,
            &format!("/grades/document/{}/release-all", document_id),
        )?;
        self.unit(request).await
    }

    pub async fn document_grades(&self, document_id: i64) -> Result<Vec<Grade>> {
        let request =
            self.authorized(Method::GET, &format!("/grades/document/{}", document_id))?;
        self.list(request).await
    }

    pub async fn released_document_grades(&self, document_id: i64) -> Result<Vec<Grade>> {
        let request = self.authorized(
            Method::GET,
            &format!("/grades/document/{}/released", document_id),
        )?;
        self.list(request).await
    }
}
