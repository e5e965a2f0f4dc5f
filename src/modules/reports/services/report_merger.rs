// Report Merger: appends externally stored documents (lab report PDFs)
// after the composed invoice document.
//
// Fetches run concurrently, but pages are always assembled in the
// caller-specified list order. A single unreachable or unparseable
// attachment is logged and omitted; only a broken primary document fails
// the merge.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::warn;

use crate::core::{AppError, Result};

/// Where an external document lives: a direct URL, or a storage key the
/// object-store collaborator resolves to a time-limited signed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentLocation {
    Url(String),
    StorageKey(String),
}

/// Downloads one external document
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Object storage collaborator: resolves a stored document key to a
/// fetchable, time-limited signed URL
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn resolve_signed_url(&self, key: &str) -> Result<String>;
}

/// Storage service client resolving keys over HTTP
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    ttl_secs: u64,
}

impl HttpDocumentStore {
    pub fn new(client: reqwest::Client, base_url: String, ttl_secs: u64) -> Self {
        Self {
            client,
            base_url,
            ttl_secs,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct SignedUrlResponse {
    url: String,
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn resolve_signed_url(&self, key: &str) -> Result<String> {
        let endpoint = format!(
            "{}/documents/{}/signed-url?ttl={}",
            self.base_url.trim_end_matches('/'),
            key,
            self.ttl_secs
        );

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::storage(format!("Signed URL for '{}': {}", key, e)))?;

        let signed: SignedUrlResponse = response.json().await?;
        Ok(signed.url)
    }
}

/// Merges the composed invoice with external documents
pub struct ReportMerger {
    fetcher: Arc<dyn DocumentFetcher>,
    store: Arc<dyn DocumentStore>,
}

impl ReportMerger {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, store: Arc<dyn DocumentStore>) -> Self {
        Self { fetcher, store }
    }

    /// Append the documents at `locations` after `primary`, in list order.
    ///
    /// Fetches are issued concurrently; assembly order is the list index,
    /// not completion order. Each failed location degrades to "omit that
    /// document".
    pub async fn merge(
        &self,
        primary: Vec<u8>,
        locations: &[AttachmentLocation],
    ) -> Result<Vec<u8>> {
        if locations.is_empty() {
            return Ok(primary);
        }

        let fetches = locations
            .iter()
            .enumerate()
            .map(|(index, location)| async move {
                (index, location, self.fetch_one(location).await)
            });

        // join_all yields results in input order, which is the
        // caller-specified list order
        let mut attachments: Vec<Vec<u8>> = Vec::with_capacity(locations.len());
        for (index, location, outcome) in join_all(fetches).await {
            match outcome {
                Ok(bytes) => attachments.push(bytes),
                Err(e) => {
                    warn!(index, ?location, error = %e, "External document omitted");
                }
            }
        }

        merge_documents(&primary, attachments)
    }

    async fn fetch_one(&self, location: &AttachmentLocation) -> Result<Vec<u8>> {
        let url = match location {
            AttachmentLocation::Url(url) => url.clone(),
            AttachmentLocation::StorageKey(key) => self.store.resolve_signed_url(key).await?,
        };
        self.fetcher.fetch(&url).await
    }
}

/// Concatenate attachment pages after the primary document's pages.
///
/// The primary must parse; an attachment that does not parse is logged
/// and skipped.
pub fn merge_documents(primary: &[u8], attachments: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    let primary_doc = Document::load_mem(primary)
        .map_err(|e| AppError::composition(format!("Primary document is not a valid PDF: {}", e)))?;

    let mut parsed = vec![primary_doc];
    for (index, bytes) in attachments.into_iter().enumerate() {
        match Document::load_mem(&bytes) {
            Ok(doc) => parsed.push(doc),
            Err(e) => warn!(index, error = %e, "Unparseable attachment omitted"),
        }
    }

    if parsed.len() == 1 {
        return Ok(primary.to_vec());
    }

    let mut merged = merge_parsed(parsed)?;

    let mut bytes = Vec::new();
    merged
        .save_to(&mut bytes)
        .map_err(|e| AppError::composition(format!("Merged PDF serialization failed: {}", e)))?;

    Ok(bytes)
}

/// Combine parsed documents into one page tree, preserving document and
/// page order.
fn merge_parsed(parsed: Vec<Document>) -> Result<Document> {
    let mut max_id = 1;
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in parsed {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration preserves the
        // document's own page order
        for (_, object_id) in doc.get_pages() {
            let object = doc
                .get_object(object_id)
                .map_err(|e| AppError::composition(format!("Broken page object: {}", e)))?
                .to_owned();
            page_objects.push((object_id, object));
        }

        all_objects.extend(doc.objects.clone());
    }

    let mut catalog_id: Option<ObjectId> = None;
    let mut pages_id: Option<ObjectId> = None;
    let mut pages_dict = Dictionary::new();

    for (object_id, object) in &all_objects {
        if let Ok(dict) = object.as_dict() {
            if let Ok(Object::Name(name)) = dict.get(b"Type") {
                if name == b"Catalog" {
                    catalog_id.get_or_insert(*object_id);
                } else if name == b"Pages" {
                    // Fold every source Pages node's inheritable entries
                    // into the single merged node
                    for (key, value) in dict.iter() {
                        pages_dict.set(key.clone(), value.clone());
                    }
                    pages_id.get_or_insert(*object_id);
                }
            }
        }
    }

    let catalog_id =
        catalog_id.ok_or_else(|| AppError::composition("No catalog in merged documents"))?;
    let pages_id =
        pages_id.ok_or_else(|| AppError::composition("No page tree in merged documents"))?;

    let mut merged = Document::with_version("1.5");

    for (object_id, object) in all_objects {
        let skip = object
            .as_dict()
            .ok()
            .and_then(|dict| dict.get(b"Type").ok())
            .and_then(|t| match t {
                Object::Name(name) => Some(name.as_slice()),
                _ => None,
            })
            .map(|name| matches!(name, b"Catalog" | b"Pages" | b"Page" | b"Outlines"))
            .unwrap_or(false);

        if !skip {
            merged.objects.insert(object_id, object);
        }
    }

    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_objects.len() as i64));
    pages_dict.set(
        "Kids",
        Object::Array(
            page_objects
                .iter()
                .map(|(id, _)| Object::Reference(*id))
                .collect(),
        ),
    );
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    for (object_id, object) in page_objects {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(object_id, Object::Dictionary(dict));
        }
    }

    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        }),
    );
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}
