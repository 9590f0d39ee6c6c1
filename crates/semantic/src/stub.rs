use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::SemanticConfig;

/// Vector width of the stub for a given tier.
pub(crate) fn stub_dimension(tier: &str) -> usize {
    match tier {
        "fast" => 384,
        "accurate" => 1024,
        _ => 768,
    }
}

/// Deterministic stand-in for a real model, used in `"fast"` mode.
///
/// Values are sinusoids of a hash of the text, so identical text always maps to
/// the identical vector and distinct text almost always maps elsewhere. There is
/// no notion of meaning here; only exact-text matches score 1.0.
pub(crate) fn make_stub_vector(text: &str, cfg: &SemanticConfig) -> Vec<f32> {
    let dim = stub_dimension(&cfg.tier);
    let h = hash64(text.as_bytes());
    let mut v: Vec<f32> = (0..dim)
        .map(|idx| ((h >> (idx % 32)) as f32 * 0.0001).sin())
        .collect();
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(tier: &str, normalize: bool) -> SemanticConfig {
        SemanticConfig {
            tier: tier.into(),
            normalize,
            ..Default::default()
        }
    }

    #[test]
    fn dimension_per_tier() {
        assert_eq!(make_stub_vector("x", &cfg("fast", false)).len(), 384);
        assert_eq!(make_stub_vector("x", &cfg("balanced", false)).len(), 768);
        assert_eq!(make_stub_vector("x", &cfg("accurate", false)).len(), 1024);
    }

    #[test]
    fn deterministic_for_same_text() {
        let c = cfg("fast", true);
        assert_eq!(make_stub_vector("revenue", &c), make_stub_vector("revenue", &c));
    }

    #[test]
    fn different_text_differs() {
        let c = cfg("fast", false);
        assert_ne!(make_stub_vector("hello", &c), make_stub_vector("world", &c));
    }

    #[test]
    fn normalized_has_unit_length() {
        let v = make_stub_vector("test", &cfg("fast", true));
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm={norm}");
    }

    #[test]
    fn empty_text_still_produces_vector() {
        let v = make_stub_vector("", &cfg("fast", false));
        assert_eq!(v.len(), 384);
    }

    #[test]
    fn values_in_unit_range() {
        for val in make_stub_vector("bounds", &cfg("balanced", false)) {
            assert!((-1.0..=1.0).contains(&val));
        }
    }
}
