//! Review endpoints

use fyp_common::models::{NewReview, Review};
use reqwest::Method;

use super::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// Record a review; the backend moves the document to the decided status
    pub async fn create_review(&self, review: &NewReview, reviewer_id: i64) -> Result<Review> {
        let request = self
            .authorized(Method::POST, "/reviews")?
            .query(&[("reviewerId", reviewer_id)])
            .json(review);
        self.json(request).await
    }

    pub async fn document_reviews(&self, document_id: i64) -> Result<Vec<Review>> {
        let request =
            self.authorized(Method::GET, &format!("/reviews/document/{}", document_id))?;
        self.list(request).await
    }
}
