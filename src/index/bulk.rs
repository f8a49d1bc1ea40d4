use crate::document::PlayDocument;
use crate::index::client::{BulkReport, BulkResponse, IndexClient, IndexError};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Documents collected over a run, keyed by identity key.
///
/// A later document with an already-seen key replaces the earlier one, so each
/// key is submitted exactly once and the index ends in the same state it would
/// after applying both writes in order.
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    documents: BTreeMap<String, PlayDocument>,
}

impl DocumentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the document replaced one with the same key.
    pub fn insert(&mut self, document: PlayDocument) -> bool {
        self.documents.insert(document.identity_key(), document).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&PlayDocument> {
        self.documents.get(key)
    }

    pub fn into_entries(self) -> Vec<(String, PlayDocument)> {
        self.documents.into_iter().collect()
    }
}

/// Final destination of a run's documents.
pub trait BulkSink {
    async fn load(&self, batch: DocumentBatch) -> Result<BulkReport, IndexError>;
}

/// Writes batches to the index through `_bulk`, `chunk_size` documents per request.
#[derive(Debug, Clone)]
pub struct BulkLoader {
    client: IndexClient,
    index: String,
    chunk_size: usize,
}

impl BulkLoader {
    pub fn new(client: IndexClient, index: impl Into<String>, chunk_size: usize) -> Self {
        Self { client, index: index.into(), chunk_size: chunk_size.max(1) }
    }
}

impl BulkSink for BulkLoader {
    async fn load(&self, batch: DocumentBatch) -> Result<BulkReport, IndexError> {
        if batch.is_empty() {
            debug!("nothing to load into {}", self.index);
            return Ok(BulkReport::default());
        }

        let entries = batch.into_entries();
        let mut report = BulkReport { attempted: entries.len(), ..Default::default() };
        let mut last_error = None;

        for (n, chunk) in entries.chunks(self.chunk_size).enumerate() {
            report.chunks += 1;
            let body = encode_bulk_body(&self.index, chunk)?;
            match self.client.bulk(body).await {
                Ok(response) => {
                    let rejected = log_rejections(&response);
                    report.rejected += rejected;
                    report.indexed += chunk.len().saturating_sub(rejected);
                    debug!("bulk chunk {n}: {} documents, {rejected} rejected", chunk.len());
                }
                Err(e) => {
                    error!("bulk chunk {n} ({} documents) failed: {e}", chunk.len());
                    report.failed_chunks += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            None => {
                info!(
                    "indexed {} of {} documents into {}",
                    report.indexed, report.attempted, self.index
                );
                Ok(report)
            }
            Some(e) => Err(IndexError::Bulk { report, last_error: Box::new(e) }),
        }
    }
}

fn log_rejections(response: &BulkResponse) -> usize {
    if !response.errors {
        return 0;
    }
    let mut rejected = 0;
    for item in response.rejected() {
        rejected += 1;
        warn!(
            "document {} rejected with status {}: {}",
            item.id.as_deref().unwrap_or("?"),
            item.status,
            item.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
        );
    }
    rejected
}

#[derive(Serialize)]
struct BulkAction<'a> {
    index: BulkTarget<'a>,
}

#[derive(Serialize)]
struct BulkTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: &'a str,
}

/// NDJSON body: an `index` action line, then the document line, per entry.
pub fn encode_bulk_body(index: &str, entries: &[(String, PlayDocument)]) -> Result<String, IndexError> {
    let mut body = String::new();
    for (id, document) in entries {
        let action = BulkAction { index: BulkTarget { index, id } };
        body.push_str(&serde_json::to_string(&action).map_err(IndexError::Encoding)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(document).map_err(IndexError::Encoding)?);
        body.push('\n');
    }
    Ok(body)
}
