extern crate alloc;

pub mod account;
pub mod block;
pub mod transaction;

mod constants;
mod elements;
mod errors;

// RE-EXPORTS
// ================================================================================================

pub use constants::*;
pub use elements::ElementWriter;
pub use errors::{AccountError, AmountError};
pub use miden_crypto::{
    EMPTY_WORD, Felt, FieldElement, ONE, StarkField, Word, ZERO,
    hash::rpo::{Rpo256 as Hasher, RpoDigest as Digest},
};
pub use num_bigint::{BigInt, BigUint};

pub mod crypto {
    pub use miden_crypto::{dsa, hash, merkle};
}

pub mod utils {
    use num_bigint::{BigInt, BigUint, Sign};

    pub use miden_crypto::utils::{bytes_to_hex_string, hex_to_bytes};

    pub mod serde {
        pub use miden_crypto::utils::{
            ByteReader, ByteWriter, Deserializable, DeserializationError, Serializable,
        };
    }

    use self::serde::{ByteReader, ByteWriter, DeserializationError};

    /// Writes an arbitrary-precision amount as a length-prefixed little-endian byte string.
    pub fn write_amount<W: ByteWriter>(target: &mut W, amount: &BigUint) {
        let bytes = amount.to_bytes_le();
        target.write_usize(bytes.len());
        target.write_bytes(&bytes);
    }

    /// Reads an amount written by [`write_amount`].
    pub fn read_amount<R: ByteReader>(source: &mut R) -> Result<BigUint, DeserializationError> {
        let len = source.read_usize()?;
        let bytes = source.read_vec(len)?;
        Ok(BigUint::from_bytes_le(&bytes))
    }

    /// Writes a signed amount as a sign flag followed by its magnitude.
    pub fn write_signed_amount<W: ByteWriter>(target: &mut W, amount: &BigInt) {
        target.write_bool(amount.sign() == Sign::Minus);
        write_amount(target, amount.magnitude());
    }

    /// Reads an amount written by [`write_signed_amount`].
    pub fn read_signed_amount<R: ByteReader>(
        source: &mut R,
    ) -> Result<BigInt, DeserializationError> {
        let negative = source.read_bool()?;
        let magnitude = read_amount(source)?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(BigInt::from_biguint(sign, magnitude))
    }

    /// Writes a UTF-8 string as a length-prefixed byte string.
    pub fn write_string<W: ByteWriter>(target: &mut W, value: &str) {
        target.write_usize(value.len());
        target.write_bytes(value.as_bytes());
    }

    /// Reads a string written by [`write_string`].
    pub fn read_string<R: ByteReader>(source: &mut R) -> Result<String, DeserializationError> {
        let len = source.read_usize()?;
        let bytes = source.read_vec(len)?;
        String::from_utf8(bytes).map_err(|err| DeserializationError::InvalidValue(err.to_string()))
    }
}
