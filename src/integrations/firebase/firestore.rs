// src/integrations/firebase/firestore.rs
//
// Firestore document store over the v1 REST API.
//
// RULES:
// - Documents live at projects/{project}/databases/(default)/documents/{collection}/{id}
// - Every request carries the API key as the `key` query parameter
// - Listing follows `nextPageToken` until the collection is exhausted
// - Overwrite sends an update mask so untouched fields (createdAt) survive

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::values::{decode_fields, encode_fields};
use super::{ensure_found, ensure_success, FirebaseSettings};
use crate::error::{AppError, AppResult};
use crate::repositories::{Document, DocumentStore, Fields};

const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RestDocument {
    fn into_document(self) -> AppResult<Document> {
        let id = document_id(&self.name)?;
        Ok(Document::new(id, decode_fields(&self.fields)?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteBody {
    fields: Map<String, Value>,
}

/// Last path segment of a full document resource name
fn document_id(name: &str) -> AppResult<String> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Other(format!("Malformed document name: {}", name)))
}

pub struct FirestoreDocumentStore {
    client: Client,
    root: Url,
    project_id: String,
    api_key: String,
}

impl FirestoreDocumentStore {
    pub fn new(settings: &FirebaseSettings) -> AppResult<Self> {
        let root = Url::parse(&settings.firestore_root).map_err(|e| {
            AppError::Config(format!(
                "Invalid Firestore root '{}': {}",
                settings.firestore_root, e
            ))
        })?;

        Ok(Self {
            client: settings.http_client()?,
            root,
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn url(&self, collection: &str, id: Option<&str>) -> AppResult<Url> {
        let mut url = self.root.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config(format!("Firestore root cannot be a base: {}", self.root)))?;
            segments.pop_if_empty().extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
            ]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(collection, None)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.client.get(url).send().await?;
            let page: ListResponse = ensure_success(response, collection).await?.json().await?;

            for doc in page.documents {
                documents.push(doc.into_document()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Firestore listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let response = self.client.get(self.url(collection, Some(id))?).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: RestDocument = ensure_success(response, id).await?.json().await?;
        Ok(Some(doc.into_document()?))
    }

    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String> {
        let body = WriteBody {
            fields: encode_fields(&fields),
        };

        let response = self
            .client
            .post(self.url(collection, None)?)
            .json(&body)
            .send()
            .await?;
        let doc: RestDocument = ensure_success(response, collection).await?.json().await?;

        let id = document_id(&doc.name)?;
        log::info!("Firestore created {}/{}", collection, id);
        Ok(id)
    }

    async fn overwrite(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        let mut url = self.url(collection, Some(id))?;
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", name);
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let body = WriteBody {
            fields: encode_fields(&fields),
        };

        let response = self.client.patch(url).json(&body).send().await?;
        ensure_found(response, &format!("{}/{}", collection, id)).await?;

        log::info!("Firestore updated {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(collection, Some(id))?)
            .send()
            .await?;

        // Firestore answers 200 for missing documents; a 404 here means the
        // project or database is wrong
        ensure_success(response, id).await?;

        log::info!("Firestore deleted {}/{}", collection, id);
        Ok(())
    }
}
