use num_bigint::BigUint;

use crate::{Digest, Felt, Word, ZERO};

// ELEMENT WRITER
// ================================================================================================

/// Accumulates field elements from typed values.
///
/// Integers wider than 32 bits are split into 32-bit limbs so that no value is silently reduced
/// modulo the field. Amounts always occupy four limbs (128 bits, least significant limb first);
/// callers are expected to have range-checked them against [`crate::STATE_AMOUNT_BITS`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ElementWriter {
    elements: Vec<Felt>,
}

impl ElementWriter {
    /// Number of limbs used to encode a state amount.
    pub const AMOUNT_LIMBS: usize = 4;

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a writer whose first element is the provided tag.
    pub fn with_tag(tag: u8) -> Self {
        let mut writer = Self::new();
        writer.push_u32(tag as u32);
        writer
    }

    pub fn push_u32(&mut self, value: u32) -> &mut Self {
        self.elements.push(Felt::from(value));
        self
    }

    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        self.elements.push(Felt::from((value >> 32) as u32));
        self.elements.push(Felt::from(value as u32));
        self
    }

    /// Pushes a value which is known to be smaller than the field modulus as a single element.
    pub fn push_felt(&mut self, value: Felt) -> &mut Self {
        self.elements.push(value);
        self
    }

    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.push_u32(value as u32)
    }

    pub fn push_amount(&mut self, amount: &BigUint) -> &mut Self {
        let mut digits = amount.iter_u32_digits();
        for _ in 0..Self::AMOUNT_LIMBS {
            self.elements.push(Felt::from(digits.next().unwrap_or(0)));
        }
        self
    }

    pub fn push_digest(&mut self, digest: Digest) -> &mut Self {
        self.elements.extend(Word::from(digest));
        self
    }

    /// Pushes raw bytes as big-endian 32-bit limbs, zero-padding the final limb.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for chunk in bytes.chunks(4) {
            let mut limb = [0u8; 4];
            limb[..chunk.len()].copy_from_slice(chunk);
            self.elements.push(Felt::from(u32::from_be_bytes(limb)));
        }
        self
    }

    /// Appends the elements of another writer.
    pub fn extend(&mut self, other: &ElementWriter) -> &mut Self {
        self.elements.extend_from_slice(&other.elements);
        self
    }

    /// Pads the writer with zeros up to `len` elements. Does nothing if already longer.
    pub fn pad_to(&mut self, len: usize) -> &mut Self {
        if self.elements.len() < len {
            self.elements.resize(len, ZERO);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_elements(&self) -> &[Felt] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Felt> {
        self.elements
    }
}

// TESTS
// ================================================================================================
