//! Merkle Integrity (mi-sha256) payload encoding.
//!
//! The payload is split into fixed-size records hashed into a backward
//! chain, so a verifier can check the body incrementally against the single
//! root digest carried in the signed `MI` header. Wire form: the record
//! size as a big-endian u64, then records interleaved with the proof of the
//! record that follows them.

use sha2::{Digest, Sha256};

/// Record size used for every produced exchange.
pub const MI_RECORD_SIZE: usize = 4096;

/// An MI-encoded payload: the chain root plus the framed body.
pub struct MiEncoded {
    pub digest: [u8; 32],
    pub body: Vec<u8>,
}

/// Encode `payload` into mi-sha256 form with the given record size.
///
/// An empty payload is a single empty record, so it still has a digest.
pub fn encode(payload: &[u8], record_size: usize) -> MiEncoded {
    assert!(record_size > 0, "record size must be positive");

    let records: Vec<&[u8]> = if payload.is_empty() {
        vec![&[]]
    } else {
        payload.chunks(record_size).collect()
    };
    let n = records.len();

    // Proofs chain from the last record backwards. The terminal record is
    // hashed with a 0x00 sentinel, interior records fold in the next proof
    // with a 0x01 sentinel.
    let mut proofs = vec![[0u8; 32]; n];
    let mut hasher = Sha256::new();
    hasher.update(records[n - 1]);
    hasher.update([0u8]);
    proofs[n - 1] = hasher.finalize().into();
    for i in (0..n - 1).rev() {
        let mut hasher = Sha256::new();
        hasher.update(records[i]);
        hasher.update(proofs[i + 1]);
        hasher.update([1u8]);
        proofs[i] = hasher.finalize().into();
    }

    let mut body = Vec::with_capacity(8 + payload.len() + 32 * (n - 1));
    body.extend_from_slice(&(record_size as u64).to_be_bytes());
    for i in 0..n {
        body.extend_from_slice(records[i]);
        if i + 1 < n {
            body.extend_from_slice(&proofs[i + 1]);
        }
    }

    MiEncoded {
        digest: proofs[0],
        body,
    }
}
