// Start of file: /src/models/vector.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::Metadata;

/// One text or a batch of texts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TextInput {
    One(String),
    Many(Vec<String>),
}

impl TextInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TextInput::One(text) => vec![text],
            TextInput::Many(texts) => texts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: TextInput,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub text: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingMetadata {
    #[serde(flatten)]
    pub base: Metadata,
    pub model: String,
    pub dimensions: usize,
    pub normalized: bool,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    pub embeddings: Vec<Embedding>,
    pub metadata: EmbeddingMetadata,
}

/// Text to embed, or a vector used as is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum VectorQuery {
    Text(String),
    Vector(Vec<f32>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchRequest {
    pub query: VectorQuery,
    pub collection: String,
    #[serde(default = "default_num_results")]
    pub num_results: usize,
    #[serde(default)]
    pub filter: Option<Map<String, Value>>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_num_results() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorSearchMetadata {
    #[serde(flatten)]
    pub base: Metadata,
    pub collection: String,
    pub index_type: String,
    pub vector_dimensions: usize,
    pub total_vectors_searched: usize,
    pub filtered_vectors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorSearchResponse {
    pub results: Vec<VectorRecord>,
    pub metadata: VectorSearchMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertVectorsRequest {
    pub collection: String,
    pub vectors: Vec<VectorRecord>,
    #[serde(default)]
    pub create_collection: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpsertVectorsResponse {
    pub inserted_count: usize,
    pub updated_count: usize,
    pub collection: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub dimensions: usize,
    pub vector_count: usize,
    pub index_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionList {
    pub collections: Vec<CollectionInfo>,
    pub total_count: usize,
    pub database_type: String,
}

// End of file: /src/models/vector.rs
