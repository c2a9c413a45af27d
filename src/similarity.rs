/// Number of related documents kept per source document by default.
pub const DEFAULT_TOP_K: usize = 5;

/// A ranked neighbour of a source document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the neighbour in the document enumeration.
    pub index: usize,
    pub score: f32,
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in [-1.0, 1.0] where 1.0 means identical direction.
/// Empty vectors, vectors of different lengths, zero-norm vectors and
/// vectors with non-finite components all score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = x as f64;
        let y = y as f64;
        dot = x.mul_add(y, dot);
        norm_a = x.mul_add(x, norm_a);
        norm_b = y.mul_add(y, norm_b);
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    // Folds NaN and -0.0 into 0.0 so equal scores tie under `total_cmp`.
    let score = (dot / denom) as f32;
    if score.is_finite() && score != 0.0 {
        score
    } else {
        0.0
    }
}

/// Full pairwise cosine similarity matrix.
///
/// Only the upper triangle is computed; the lower one is mirrored so the
/// matrix is exactly symmetric.
pub fn similarity_matrix(vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = vectors.len();
    let mut matrix = vec![vec![0.0_f32; n]; n];

    for i in 0..n {
        for j in i..n {
            let score = cosine_similarity(&vectors[i], &vectors[j]);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }

    matrix
}

/// Rank every document's nearest neighbours.
///
/// Entry `i` of the result lists at most `k` other documents sorted by
/// descending similarity to document `i`. A document is never its own
/// neighbour, and equal scores keep ascending index order.
pub fn rank(vectors: &[Vec<f32>], k: usize) -> Vec<Vec<Neighbor>> {
    let matrix = similarity_matrix(vectors);
    matrix
        .iter()
        .enumerate()
        .map(|(i, row)| top_k(row, i, k))
        .collect()
}

fn top_k(row: &[f32], source: usize, k: usize) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = row
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != source)
        .map(|(index, &score)| Neighbor { index, score })
        .collect();

    // Stable sort: equal scores stay in index order.
    neighbors.sort_by(|a, b| b.score.total_cmp(&a.score));
    neighbors.truncate(k);
    neighbors
}
