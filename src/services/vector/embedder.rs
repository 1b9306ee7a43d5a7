// Start of file: /src/services/vector/embedder.rs

// * Deterministic feature-hashing embedder.
// * Each token is hashed with SHA-256 into a signed bucket, so equal
// * texts always map to equal vectors and shared words raise similarity.

use sha2::{Digest, Sha256};

pub const FALLBACK_DIMENSIONS: usize = 384;

const MODEL_DIMENSIONS: [(&str, usize); 7] = [
    ("text-embedding-ada-002", 1536),
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("gpt-3.5-turbo", 1536),
    ("gpt-4", 1536),
    ("all-mpnet-base-v2", 768),
    ("all-MiniLM-L6-v2", 384),
];

/// Output size for a model name; unknown models get 384.
pub fn model_dimensions(model: &str) -> usize {
    MODEL_DIMENSIONS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, dims)| *dims)
        .unwrap_or(FALLBACK_DIMENSIONS)
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

pub fn embed(text: &str, dimensions: usize, normalize: bool) -> Vec<f32> {
    let mut vector: Vec<f32> = vec![0.0; dimensions.max(1)];

    for token in tokens(text) {
        let digest = Sha256::digest(token.as_bytes());
        let mut bucket_bytes: [u8; 8] = [0; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);

        let bucket: usize = (u64::from_le_bytes(bucket_bytes) % vector.len() as u64) as usize;
        let sign: f32 = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    if normalize {
        l2_normalize(&mut vector);
    }
    vector
}

/// Divides by the L2 norm. A zero vector stays zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

// End of file: /src/services/vector/embedder.rs
