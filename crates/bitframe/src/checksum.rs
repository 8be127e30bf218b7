//! Checksum descriptors and built-in checksum algorithms.
//!
//! A checksum function receives the full serialized message with the checksum
//! field zeroed. Its result is masked to the checksum field's bit width.

use std::{fmt, sync::Arc};

/// Function computing a checksum over serialized message bytes.
pub type ChecksumFn = Arc<dyn Fn(&[u8]) -> u64 + Send + Sync>;

/// Common single-pass checksums over message bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// Wrapping sum of all bytes.
    Sum,
    /// XOR of all bytes.
    Xor,
    /// Two's complement of the byte sum (longitudinal redundancy check).
    TwosComplementSum,
}

impl ChecksumAlgorithm {
    pub fn compute(self, bytes: &[u8]) -> u64 {
        match self {
            ChecksumAlgorithm::Sum => sum(bytes),
            ChecksumAlgorithm::Xor => bytes.iter().fold(0u64, |acc, &b| acc ^ b as u64),
            ChecksumAlgorithm::TwosComplementSum => sum(bytes).wrapping_neg(),
        }
    }
}

fn sum(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| acc.wrapping_add(b as u64))
}

/// Binds a checksum function to the field that stores its result.
#[derive(Clone)]
pub struct Checksum {
    /// Name of the field holding the checksum.
    pub field: String,
    function: ChecksumFn,
}

impl Checksum {
    pub fn new<F>(field: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
    {
        Checksum {
            field: field.into(),
            function: Arc::new(function),
        }
    }

    pub fn with_algorithm(field: impl Into<String>, algorithm: ChecksumAlgorithm) -> Self {
        Self::new(field, move |bytes: &[u8]| algorithm.compute(bytes))
    }

    /// Applies the checksum function and keeps the low `bits` bits of the result.
    pub fn compute(&self, bytes: &[u8], bits: usize) -> u64 {
        let raw = (self.function)(bytes);
        if bits >= 64 { raw } else { raw & ((1u64 << bits) - 1) }
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checksum")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}
