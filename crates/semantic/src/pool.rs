use crate::SemanticError;

/// Turns a model output into one vector per input text.
///
/// `[batch, hidden]` outputs are already sentence vectors. `[batch, seq, hidden]`
/// outputs are token embeddings and get mean-pooled over the positions whose
/// attention `mask` (flattened `[batch, seq]`) is non-zero.
pub(crate) fn pool_token_embeddings(
    shape: &[usize],
    values: &[f32],
    mask: &[i64],
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(SemanticError::Inference(format!(
            "model output has {} values for shape {shape:?}",
            values.len()
        )));
    }

    match *shape {
        [_, hidden] if hidden > 0 => Ok(values.chunks(hidden).map(<[f32]>::to_vec).collect()),
        [batch, seq, hidden] => {
            if mask.len() != batch * seq {
                return Err(SemanticError::Inference(format!(
                    "attention mask covers {} positions, output has {}",
                    mask.len(),
                    batch * seq
                )));
            }
            let mut pooled = Vec::with_capacity(batch);
            for b in 0..batch {
                let mut sum = vec![0.0f32; hidden];
                let mut count = 0usize;
                for t in 0..seq {
                    if mask[b * seq + t] == 0 {
                        continue;
                    }
                    let start = (b * seq + t) * hidden;
                    for (acc, &v) in sum.iter_mut().zip(&values[start..start + hidden]) {
                        *acc += v;
                    }
                    count += 1;
                }
                let denom = count.max(1) as f32;
                sum.iter_mut().for_each(|v| *v /= denom);
                pooled.push(sum);
            }
            Ok(pooled)
        }
        _ => Err(SemanticError::Inference(format!(
            "unsupported model output shape {shape:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_outputs_split_per_row() {
        let out = pool_token_embeddings(&[2, 2], &[1.0, 2.0, 3.0, 4.0], &[]).unwrap();
        assert_eq!(out, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn token_outputs_mean_pool_over_mask() {
        // batch 2, seq 3, hidden 2; second text has one padding position.
        let values = [
            1.0, 1.0, 3.0, 3.0, 5.0, 5.0, //
            2.0, 4.0, 4.0, 8.0, 100.0, 100.0,
        ];
        let mask = [1, 1, 1, 1, 1, 0];
        let out = pool_token_embeddings(&[2, 3, 2], &values, &mask).unwrap();
        assert_eq!(out, vec![vec![3.0, 3.0], vec![3.0, 6.0]]);
    }

    #[test]
    fn fully_masked_row_is_zero() {
        let out = pool_token_embeddings(&[1, 2, 2], &[1.0, 2.0, 3.0, 4.0], &[0, 0]).unwrap();
        assert_eq!(out, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(pool_token_embeddings(&[1, 2, 2], &[1.0; 3], &[1, 1]).is_err());
        assert!(pool_token_embeddings(&[1, 2, 2], &[1.0; 4], &[1]).is_err());
        assert!(pool_token_embeddings(&[4], &[1.0; 4], &[]).is_err());
    }
}
