//! Binary embedding codec for durable storage.
//!
//! Layout: `[u32 LE dimension][f32 LE; dimension]`. The explicit header
//! makes truncated or foreign blobs detectable instead of silently
//! decoding into garbage.

use aula_core::errors::{AulaResult, StorageError};

/// Encode a vector into the portable blob format.
pub fn encode(embedding: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + embedding.len() * 4);
    out.extend_from_slice(&(embedding.len() as u32).to_le_bytes());
    for v in embedding {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Decode a blob, validating the dimension header against the byte length.
pub fn decode(blob: &[u8]) -> AulaResult<Vec<f32>> {
    if blob.len() < 4 {
        return Err(StorageError::CorruptEmbedding {
            details: format!("blob of {} bytes is shorter than the header", blob.len()),
        }
        .into());
    }
    let dim = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
    let body = &blob[4..];
    if body.len() != dim * 4 {
        return Err(StorageError::CorruptEmbedding {
            details: format!(
                "header declares {} dims but body holds {} bytes",
                dim,
                body.len()
            ),
        }
        .into());
    }
    Ok(body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let v = vec![0.25f32, -1.5, 3.75, 0.0];
        let blob = encode(&v);
        assert_eq!(decode(&blob).unwrap(), v);
    }

    #[test]
    fn empty_vector_round_trips() {
        let blob = encode(&[]);
        assert_eq!(blob.len(), 4);
        assert!(decode(&blob).unwrap().is_empty());
    }

    #[test]
    fn rejects_truncated_blob() {
        let mut blob = encode(&[1.0, 2.0]);
        blob.truncate(blob.len() - 3);
        assert!(decode(&blob).is_err());
    }

    #[test]
    fn rejects_header_shorter_than_four_bytes() {
        assert!(decode(&[0x01, 0x00]).is_err());
    }

    #[test]
    fn rejects_mismatched_header() {
        let mut blob = encode(&[1.0, 2.0, 3.0]);
        // Claim 5 dims while carrying 3.
        blob[0] = 5;
        assert!(decode(&blob).is_err());
    }
}
