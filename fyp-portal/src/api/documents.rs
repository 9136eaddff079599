//! Document endpoints

use std::path::Path;

use fyp_common::models::{Document, DocumentKind, DocumentVersion};
use fyp_common::DocumentStatus;
use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::ApiClient;
use crate::error::{PortalError, Result};

/// A file to send as a multipart part
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PortalError::validation(format!("Cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = guess_mime(&file_name).map(str::to_string);
        Ok(Self {
            file_name,
            bytes,
            mime,
        })
    }

    fn into_part(self) -> Result<Part> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.mime {
            Some(mime) => part
                .mime_str(&mime)
                .map_err(|e| PortalError::validation(e.to_string())),
            None => Ok(part),
        }
    }
}

fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "zip" => Some("application/zip"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

impl ApiClient {
    /// First upload for a deliverable; creates the document in DRAFT
    pub async fn create_document(
        &self,
        student_id: i64,
        kind: DocumentKind,
        title: &str,
        description: Option<&str>,
        file: FileUpload,
    ) -> Result<Document> {
        let mut form = Form::new()
            .text("studentId", student_id.to_string())
            .text("type", kind.as_str())
            .text("title", title.to_string())
            .part("file", file.into_part()?);
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }
        let request = self.authorized(Method::POST, "/documents")?.multipart(form);
        self.json(request).await
    }

    pub async fn upload_version(
        &self,
        document_id: i64,
        file: FileUpload,
        change_description: Option<&str>,
    ) -> Result<Document> {
        let mut form = Form::new().part("file", file.into_part()?);
        if let Some(change) = change_description {
            form = form.text("changeDescription", change.to_string());
        }
        let request = self
            .authorized(Method::POST, &format!("/documents/{}/upload-version", document_id))?
            .multipart(form);
        self.json(request).await
    }

    pub async fn submit_document(&self, document_id: i64) -> Result<Document> {
        let request =
            self.authorized(Method::POST, &format!("/documents/{}/submit", document_id))?;
        self.json(request).await
    }

    pub async fn update_document_status(
        &self,
        document_id: i64,
        status: DocumentStatus,
    ) -> Result<Document> {
        let request = self
            .authorized(Method::PATCH, &format!("/documents/{}/status", document_id))?
            .query(&[("status", status.as_str())]);
        self.json(request).await
    }

    pub async fn get_document(&self, document_id: i64) -> Result<Document> {
        let request = self.authorized(Method::GET, &format!("/documents/{}", document_id))?;
        self.json(request).await
    }

    pub async fn student_documents(&self, student_id: i64) -> Result<Vec<Document>> {
        let request =
            self.authorized(Method::GET, &format!("/documents/student/{}", student_id))?;
        self.list(request).await
    }

    pub async fn supervisor_documents(&self, supervisor_id: i64) -> Result<Vec<Document>> {
        let request =
            self.authorized(Method::GET, &format!("/documents/supervisor/{}", supervisor_id))?;
        self.list(request).await
    }

    pub async fn submitted_documents(&self) -> Result<Vec<Document>> {
        let request = self.authorized(Method::GET, "/documents/submitted")?;
        self.list(request).await
    }

    pub async fn documents_by_status(&self, status: DocumentStatus) -> Result<Vec<Document>> {
        let request =
            self.authorized(Method::GET, &format!("/documents/status/{}", status.as_str()))?;
        self.list(request).await
    }

    pub async fn document_versions(&self, document_id: i64) -> Result<Vec<DocumentVersion>> {
        let request =
            self.authorized(Method::GET, &format!("/documents/{}/versions", document_id))?;
        self.list(request).await
    }
}
