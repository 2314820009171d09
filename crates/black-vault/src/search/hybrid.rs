use std::collections::HashMap;

/// Which retrieval arm(s) contributed a fused hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridSource {
    Vector,
    TextSearch,
    Both,
}

/// Reciprocal Rank Fusion — merges ranked lists without score normalization.
/// Formula: rrf_score(doc) = Σ 1/(k + rank_i) for each list containing doc
pub fn reciprocal_rank_fusion(
    vector_results: Vec<(String, f32)>,
    fts_results: Vec<(String, f32)>,
    k: usize,
    top_k: usize,
) -> Vec<(String, f32, HybridSource)> {
    let mut scores: HashMap<String, (f32, HybridSource)> = HashMap::new();

    for (rank, (id, _score)) in vector_results.iter().enumerate() {
        let rrf = 1.0 / (k as f32 + rank as f32 + 1.0);
        scores
            .entry(id.clone())
            .and_modify(|(s, src)| {
                *s += rrf;
                *src = HybridSource::Both;
            })
            .or_insert((rrf, HybridSource::Vector));
    }

    for (rank, (id, _score)) in fts_results.iter().enumerate() {
        let rrf = 1.0 / (k as f32 + rank as f32 + 1.0);
        scores
            .entry(id.clone())
            .and_modify(|(s, src)| {
                *s += rrf;
                *src = HybridSource::Both;
            })
            .or_insert((rrf, HybridSource::TextSearch));
    }

    let mut merged: Vec<(String, f32, HybridSource)> = scores
        .into_iter()
        .map(|(id, (score, source))| (id, score, source))
        .collect();

    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(top_k);
    merged
}

/// Min-max normalize the BM25 list to [0, 1], then alpha-blend against the
/// already-bounded semantic scores. Black Vault's Searcher calls this with
/// `alpha = 0.6` (semantic weight) and `1 - alpha = 0.4` (lexical weight) per
/// the fusion formula in §4.8. Only the lexical (BM25) side is unbounded and
/// needs normalizing; the semantic side arrives already scaled to [0, ~1.1]
/// (cosine similarity plus the recency boost) and re-normalizing it per-query
/// would distort its magnitude relative to other queries.
pub fn weighted_fusion(
    vector_results: Vec<(String, f32)>,
    fts_results: Vec<(String, f32)>,
    alpha: f32,
    top_k: usize,
) -> Vec<(String, f32, HybridSource)> {
    let normalize = |results: &[(String, f32)]| -> Vec<(String, f32)> {
        if results.is_empty() {
            return vec![];
        }
        let max = results.iter().map(|(_, s)| *s).fold(f32::MIN, f32::max);
        let min = results.iter().map(|(_, s)| *s).fold(f32::MAX, f32::min);
        let range = (max - min).max(1e-6);
        results
            .iter()
            .map(|(id, s)| (id.clone(), (s - min) / range))
            .collect()
    };

    let norm_fts = normalize(&fts_results);

    let mut scores: HashMap<String, (f32, HybridSource)> = HashMap::new();

    for (id, score) in &vector_results {
        scores.insert(id.clone(), (alpha * score, HybridSource::Vector));
    }

    for (id, score) in &norm_fts {
        scores
            .entry(id.clone())
            .and_modify(|(s, src)| {
                *s += (1.0 - alpha) * score;
                *src = HybridSource::Both;
            })
            .or_insert(((1.0 - alpha) * score, HybridSource::TextSearch));
    }

    let mut merged: Vec<(String, f32, HybridSource)> = scores
        .into_iter()
        .map(|(id, (score, source))| (id, score, source))
        .collect();

    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(top_k);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_fusion_favors_semantic_when_alpha_high() {
        let vector = vec![("a".to_string(), 0.9), ("b".to_string(), 0.1)];
        let fts = vec![("b".to_string(), 10.0), ("a".to_string(), 1.0)];
        let merged = weighted_fusion(vector, fts, 0.9, 10);
        assert_eq!(merged[0].0, "a");
    }

    #[test]
    fn weighted_fusion_handles_one_sided_results() {
        let vector = vec![("a".to_string(), 0.5)];
        let fts = vec![];
        let merged = weighted_fusion(vector, fts, 0.6, 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0, "a");
    }
}
