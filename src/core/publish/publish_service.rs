use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the document publishing workflow.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("document content is empty")]
    EmptyContent,
    #[error("document service error: {0}")]
    Service(String),
}

/// A document created at the remote service, addressable by URL.
#[derive(Debug, Clone)]
pub struct PublishedDocument {
    pub document_id: String,
    pub url: String,
}

/// Minimal document-service operations needed by the publish workflow.
#[async_trait]
pub trait DocsGateway: Send + Sync {
    /// Creates an empty document and returns its ID.
    async fn create_document(&self, title: &str) -> Result<String, PublishError>;

    /// Inserts `text` at the document's first insertion position.
    async fn insert_text(&self, document_id: &str, text: &str) -> Result<(), PublishError>;
}

/// Publishes generated profiles as new remote documents.
///
/// If the insert fails after the create succeeded, the created document is
/// orphaned and not cleaned up.
pub struct PublishService<D: DocsGateway> {
    gateway: D,
}

impl<D: DocsGateway> PublishService<D> {
    pub fn new(gateway: D) -> Self {
        Self { gateway }
    }

    pub async fn publish(
        &self,
        company_name: &str,
        content: &str,
    ) -> Result<PublishedDocument, PublishError> {
        // Checked before any remote call.
        if content.trim().is_empty() {
            return Err(PublishError::EmptyContent);
        }

        let title = format!("{} Overview", company_name);
        let document_id = self.gateway.create_document(&title).await?;
        self.gateway.insert_text(&document_id, content).await?;

        let url = format!("https://docs.google.com/document/d/{}", document_id);
        tracing::info!("Published '{}' as document {}", title, document_id);

        Ok(PublishedDocument { document_id, url })
    }
}
