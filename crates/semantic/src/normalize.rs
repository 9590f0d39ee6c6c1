/// Chunk width for the similarity loops; sized so the compiler vectorizes the inner sums.
const SIMD_CHUNK_SIZE: usize = 32;

/// In-place L2 normalization. Zero vectors are left untouched.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Cosine similarity of two equal-length vectors, in `[-1, 1]`.
///
/// Returns `0.0` when either side has zero norm. Callers check lengths; a
/// length mismatch here is a programming error and also yields `0.0`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (ca, cb) in a.chunks(SIMD_CHUNK_SIZE).zip(b.chunks(SIMD_CHUNK_SIZE)) {
        let (d, na, nb) = chunk_sums(ca, cb);
        dot += d;
        norm_a += na;
        norm_b += nb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

#[inline(always)]
fn chunk_sums(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    a.iter()
        .zip(b.iter())
        .fold((0.0, 0.0, 0.0), |(d, na, nb), (&x, &y)| {
            (d + x * y, na + x * x, nb + y * y)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_simple_vector() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let mut v = vec![0.0f32, 0.0, 0.0];
        l2_normalize_in_place(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn l2_normalize_empty_slice() {
        let mut v: Vec<f32> = vec![];
        l2_normalize_in_place(&mut v);
        assert!(v.is_empty());
    }

    #[test]
    fn cosine_identical_is_one() {
        let a = vec![0.5f32, -1.0, 2.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_is_minus_one() {
        let a = vec![1.0f32, 2.0, 3.0];
        let b: Vec<f32> = a.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let a = vec![1.0f32, 2.0, 3.0];
        let b: Vec<f32> = a.iter().map(|x| x * 10.0).collect();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_length_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn cosine_chunked_matches_scalar() {
        let a: Vec<f32> = (0..100).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..100).map(|i| (i as f32 * 0.11).cos()).collect();

        let dot: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let expected = dot / (na * nb);

        assert!((cosine_similarity(&a, &b) - expected).abs() < 1e-5);
    }
}
