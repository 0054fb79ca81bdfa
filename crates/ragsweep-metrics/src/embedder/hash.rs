use super::TokenEmbedder;
use async_trait::async_trait;

/// Offline embedder: each token becomes a signed feature-hash of the token
/// itself and its character trigrams, L2-normalised. Related spellings get
/// overlapping vectors.
#[derive(Debug, Clone)]
pub struct HashTokenEmbedder {
    dim: usize,
}

impl HashTokenEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_token(&self, token: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let token = token.to_lowercase();

        self.add_feature(&mut v, token.as_bytes(), 2.0);
        let padded: Vec<char> = format!("<{}>", token).chars().collect();
        for w in padded.windows(3) {
            let gram: String = w.iter().collect();
            self.add_feature(&mut v, gram.as_bytes(), 1.0);
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], bytes: &[u8], weight: f32) {
        let h = fnv1a(bytes);
        let idx = (h % self.dim as u64) as usize;
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        v[idx] += sign * weight;
    }
}

impl Default for HashTokenEmbedder {
    fn default() -> Self {
        Self { dim: 256 }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 1469598103934665603;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(1099511628211);
    }
    h
}

#[async_trait]
impl TokenEmbedder for HashTokenEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    async fn embed_tokens(&self, texts: &[Vec<String>]) -> anyhow::Result<Vec<Vec<Vec<f32>>>> {
        Ok(texts
            .iter()
            .map(|tokens| tokens.iter().map(|t| self.embed_token(t)).collect())
            .collect())
    }
}
