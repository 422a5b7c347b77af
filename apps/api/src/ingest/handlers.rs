use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ingest::chunker::{chunk_document, CHUNK_OVERLAP, MAX_CHUNK_SIZE};
use crate::ingest::pdf::extract_pages;
use crate::retrieval::DocumentIndex;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document: String,
    pub pages: usize,
    pub chunks: usize,
    /// False when extraction produced no text. The previously indexed
    /// document, if any, stays active.
    pub indexed: bool,
}

/// POST /api/v1/resume
///
/// Accepts exactly one PDF in a multipart `file` field, rebuilds the chunk
/// index for it, and installs the new index atomically. A corrupt or
/// text-free file is not a request failure: it reports `indexed: false` and
/// leaves the prior index in place.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let (filename, data) = read_file_field(&mut multipart).await?;

    let pages = match extract_pages(&data) {
        Ok(pages) => pages,
        Err(e) => {
            warn!("Upload '{}' could not be parsed as PDF: {e}", filename);
            Vec::new()
        }
    };

    let chunks = chunk_document(&pages, MAX_CHUNK_SIZE, CHUNK_OVERLAP);
    if chunks.is_empty() {
        warn!("Upload '{}' yielded no indexable text", filename);
        return Ok(Json(UploadResponse {
            document: filename,
            pages: pages.len(),
            chunks: 0,
            indexed: false,
        }));
    }

    let page_count = pages.len();

    let index = DocumentIndex::build(&filename, chunks, state.embedder.as_ref())
        .await
        .map_err(|e| AppError::Embedding(format!("Indexing '{filename}' failed: {e}")))?;
    let chunk_count = index.len();

    info!(
        "Indexed '{}': {} pages, {} chunks, {} dimensions",
        filename,
        page_count,
        chunk_count,
        index.dimensions()
    );
    state.index.install(index);

    Ok(Json(UploadResponse {
        document: filename,
        pages: page_count,
        chunks: chunk_count,
        indexed: true,
    }))
}

/// Pulls the single `file` field out of the multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .unwrap_or("resume.pdf")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
            return Ok((filename, data));
        }
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}
