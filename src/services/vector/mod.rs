// Start of file: /src/services/vector/mod.rs

// * In-process vector store: named collections of fixed dimension,
// * brute-force cosine search, metadata filters.

pub mod embedder;
pub mod filter;

use std::{cmp::Ordering, collections::BTreeMap, time::Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::info;

use crate::models::common::Metadata;
use crate::models::vector::{
    CollectionInfo, CollectionList, EmbedRequest, EmbedResponse, Embedding, EmbeddingMetadata,
    UpsertVectorsRequest, UpsertVectorsResponse, VectorQuery, VectorRecord, VectorSearchMetadata,
    VectorSearchRequest, VectorSearchResponse,
};
use crate::utils::error_handler::ServiceError;

use self::embedder::{cosine_similarity, embed, model_dimensions, FALLBACK_DIMENSIONS};

const INDEX_TYPE: &str = "flat";
const DATABASE_TYPE: &str = "in_memory";
const MAX_SEARCH_RESULTS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredVector {
    pub vector: Vec<f32>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub name: String,
    pub dimensions: usize,
    pub created_at: DateTime<Utc>,
    pub records: BTreeMap<String, StoredVector>,
}

impl Collection {
    fn info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.name.clone(),
            dimensions: self.dimensions,
            vector_count: self.records.len(),
            index_type: INDEX_TYPE.to_owned(),
        }
    }
}

/// Everything the store holds, as written into backups.
pub type VectorSnapshot = BTreeMap<String, Collection>;

pub struct VectorService {
    collections: RwLock<BTreeMap<String, Collection>>,
    default_model: String,
}

impl VectorService {
    pub fn new(default_model: impl Into<String>) -> Self {
        let default_model: String = default_model.into();
        info!("VectorService initialized (default model: {default_model})");

        Self {
            collections: RwLock::new(BTreeMap::new()),
            default_model,
        }
    }

    pub async fn create_embeddings(&self, request: EmbedRequest) -> Result<EmbedResponse, ServiceError> {
        let started: Instant = Instant::now();
        let texts: Vec<String> = request.text.into_vec();

        if texts.is_empty() {
            return Err(ServiceError::InvalidInput("At least one text is required".to_owned()));
        }

        let model: String = request.model.unwrap_or_else(|| self.default_model.clone());
        let dimensions: usize = model_dimensions(&model);

        let embeddings: Vec<Embedding> = texts
            .into_iter()
            .map(|text| Embedding {
                vector: embed(&text, dimensions, request.normalize),
                text,
                model: model.clone(),
                dimensions,
            })
            .collect();

        Ok(EmbedResponse {
            metadata: EmbeddingMetadata {
                base: Metadata::since(started),
                model,
                dimensions,
                normalized: request.normalize,
                batch_size: Some(embeddings.len()),
            },
            embeddings,
        })
    }

    pub async fn upsert_vectors(&self, request: UpsertVectorsRequest) -> Result<UpsertVectorsResponse, ServiceError> {
        let started: Instant = Instant::now();
        let name: String = request.collection.trim().to_owned();

        if name.is_empty() {
            return Err(ServiceError::InvalidInput("Collection name must not be empty".to_owned()));
        }

        if let Some(record) = request.vectors.iter().find(|r| r.vector.as_ref().is_some_and(Vec::is_empty)) {
            return Err(ServiceError::InvalidInput(format!("Record '{}' has an empty vector", record.id)));
        }

        let mut collections = self.collections.write().await;

        let dimensions: usize = match collections.get(&name) {
            Some(existing) => existing.dimensions,
            None if request.create_collection => request
                .vectors
                .iter()
                .find_map(|r| r.vector.as_ref().map(Vec::len))
                .unwrap_or(FALLBACK_DIMENSIONS),
            None => {
                return Err(ServiceError::NotFound(format!(
                    "Collection '{name}' does not exist and create_collection is false"
                )))
            }
        };

        // * Validate every record before touching the collection
        let mut prepared: Vec<(String, StoredVector)> = Vec::with_capacity(request.vectors.len());
        for record in request.vectors {
            if record.id.trim().is_empty() {
                return Err(ServiceError::InvalidInput("Vector id must not be empty".to_owned()));
            }

            let vector: Vec<f32> = match record.vector {
                Some(vector) => vector,
                None => match record.metadata.get("text").and_then(Value::as_str) {
                    Some(text) => embed(text, dimensions, true),
                    None => {
                        return Err(ServiceError::InvalidInput(format!(
                            "Record '{}' has neither a vector nor metadata.text",
                            record.id
                        )))
                    }
                },
            };

            if vector.len() != dimensions {
                return Err(ServiceError::InvalidInput(format!(
                    "Record '{}' has {} dimensions, collection '{name}' expects {dimensions}",
                    record.id,
                    vector.len()
                )));
            }

            prepared.push((record.id, StoredVector { vector, metadata: record.metadata }));
        }

        let collection: &mut Collection = collections.entry(name.clone()).or_insert_with(|| {
            info!("Creating collection '{name}' with {dimensions} dimensions");
            Collection {
                name: name.clone(),
                dimensions,
                created_at: Utc::now(),
                records: BTreeMap::new(),
            }
        });

        let mut inserted_count: usize = 0;
        let mut updated_count: usize = 0;
        for (id, stored) in prepared {
            match collection.records.insert(id, stored) {
                Some(_) => updated_count += 1,
                None => inserted_count += 1,
            }
        }

        info!("Upserted into '{name}': {inserted_count} inserted, {updated_count} updated");

        Ok(UpsertVectorsResponse {
            inserted_count,
            updated_count,
            collection: name,
            metadata: Metadata::since(started),
        })
    }

    pub async fn vector_search(&self, request: VectorSearchRequest) -> Result<VectorSearchResponse, ServiceError> {
        let started: Instant = Instant::now();

        if request.num_results == 0 || request.num_results > MAX_SEARCH_RESULTS {
            return Err(ServiceError::InvalidInput(format!(
                "num_results must be between 1 and {MAX_SEARCH_RESULTS}"
            )));
        }
        if let Some(f) = &request.filter {
            filter::validate(f)?;
        }

        let collections = self.collections.read().await;
        let collection: &Collection = collections.get(&request.collection).ok_or_else(|| {
            ServiceError::NotFound(format!("Collection '{}' not found", request.collection))
        })?;

        let query_vector: Vec<f32> = match request.query {
            VectorQuery::Text(text) => embed(&text, collection.dimensions, true),
            VectorQuery::Vector(vector) if vector.len() == collection.dimensions => vector,
            VectorQuery::Vector(vector) => {
                return Err(ServiceError::InvalidInput(format!(
                    "Query vector has {} dimensions, collection expects {}",
                    vector.len(),
                    collection.dimensions
                )))
            }
        };

        let min_score: Option<f32> = request
            .parameters
            .get("min_score")
            .and_then(Value::as_f64)
            .map(|s| s as f32);
        let include_vectors: bool = request
            .parameters
            .get("include_vectors")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut filtered_vectors: usize = 0;
        let mut scored: Vec<VectorRecord> = Vec::new();

        for (id, stored) in &collection.records {
            if let Some(f) = &request.filter {
                if !filter::matches(&stored.metadata, f) {
                    filtered_vectors += 1;
                    continue;
                }
            }

            let score: f32 = cosine_similarity(&query_vector, &stored.vector);
            if min_score.is_some_and(|min| score < min) {
                continue;
            }

            scored.push(VectorRecord {
                id: id.clone(),
                vector: include_vectors.then(|| stored.vector.clone()),
                score: Some(score),
                metadata: stored.metadata.clone(),
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(request.num_results);

        Ok(VectorSearchResponse {
            results: scored,
            metadata: VectorSearchMetadata {
                base: Metadata::since(started),
                collection: collection.name.clone(),
                index_type: INDEX_TYPE.to_owned(),
                vector_dimensions: collection.dimensions,
                total_vectors_searched: collection.records.len(),
                filtered_vectors,
            },
        })
    }

    pub async fn list_collections(&self) -> CollectionList {
        let collections: Vec<CollectionInfo> = self.collections.read().await.values().map(Collection::info).collect();

        CollectionList {
            total_count: collections.len(),
            collections,
            database_type: DATABASE_TYPE.to_owned(),
        }
    }

    pub async fn delete_collection(&self, name: &str) -> Result<(), ServiceError> {
        match self.collections.write().await.remove(name) {
            Some(removed) => {
                info!("Deleted collection '{name}' ({} vectors)", removed.records.len());
                Ok(())
            }
            None => Err(ServiceError::NotFound(format!("Collection '{name}' not found"))),
        }
    }

    pub async fn vector_count(&self) -> usize {
        self.collections.read().await.values().map(|c| c.records.len()).sum()
    }

    pub async fn snapshot(&self) -> VectorSnapshot {
        self.collections.read().await.clone()
    }

    /// Replaces the collections named in the snapshot; others are kept.
    pub async fn restore(&self, snapshot: VectorSnapshot) {
        let mut collections = self.collections.write().await;
        let count: usize = snapshot.len();
        collections.extend(snapshot);
        info!("Restored {count} vector collections");
    }
}

// End of file: /src/services/vector/mod.rs
