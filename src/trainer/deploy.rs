//! Deployable model encoding.
//!
//! Flattens trained weights into a compact little-endian blob: a magic tag,
//! a format version, the five dimension counts, then the weight matrices in
//! a fixed order (embedding, w1, b1, w2, b2).

use super::classifier::Model;

pub const MAGIC: &[u8; 4] = b"TCLF";
pub const FORMAT_VERSION: u16 = 1;

/// Encode a model into the deployable byte layout.
pub fn encode(model: &Model) -> Vec<u8> {
    let weight_count = model.vocab_size * model.embed_dim
        + model.embed_dim * model.hidden_dim
        + model.hidden_dim
        + model.hidden_dim * model.num_classes
        + model.num_classes;
    let mut out = Vec::with_capacity(4 + 2 + 5 * 4 + weight_count * 4);

    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    for dim in [
        model.vocab_size,
        model.embed_dim,
        model.hidden_dim,
        model.num_classes,
        model.max_len,
    ] {
        out.extend_from_slice(&(dim as u32).to_le_bytes());
    }

    let mut push_row = |row: &[f32]| {
        for v in row {
            out.extend_from_slice(&v.to_le_bytes());
        }
    };
    for row in &model.embedding {
        push_row(row);
    }
    for row in &model.w1 {
        push_row(row);
    }
    push_row(&model.b1);
    for row in &model.w2 {
        push_row(row);
    }
    push_row(&model.b2);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::classifier::{fit, FitConfig};

    fn tiny_model() -> Model {
        let padded = vec![vec![1, 2], vec![2, 1]];
        let labels = vec![0, 1];
        let cfg = FitConfig {
            epochs: 1,
            embed_dim: 4,
            hidden_dim: 3,
            ..Default::default()
        };
        fit(&padded, &labels, 3, 2, 2, &cfg, |_| {})
    }

    #[test]
    fn header_carries_magic_version_and_dims() {
        let model = tiny_model();
        let bytes = encode(&model);
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), FORMAT_VERSION);
        let dims: Vec<u32> = (0..5)
            .map(|i| {
                let off = 6 + i * 4;
                u32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
            })
            .collect();
        assert_eq!(dims, vec![3, 4, 3, 2, 2]);
    }

    #[test]
    fn body_length_matches_weight_count() {
        let model = tiny_model();
        let bytes = encode(&model);
        let weights = 3 * 4 + 4 * 3 + 3 + 3 * 2 + 2;
        assert_eq!(bytes.len(), 4 + 2 + 5 * 4 + weights * 4);
    }

    #[test]
    fn first_weight_is_the_first_embedding_entry() {
        let model = tiny_model();
        let bytes = encode(&model);
        let off = 4 + 2 + 5 * 4;
        let first = f32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]]);
        assert_eq!(first, model.embedding[0][0]);
    }
}
