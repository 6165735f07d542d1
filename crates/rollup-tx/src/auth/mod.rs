use miden_crypto::dsa::rpo_falcon512::{PublicKey, Signature};
use rollup_objects::{
    Digest, Felt, Hasher, Word,
    utils::serde::Deserializable,
};

// SIGNATURE SCHEME
// ================================================================================================

/// The hash and signature capability used to authenticate transactions.
///
/// The message signed for a transaction is `hash(signing fields)`. Implementations must be
/// deterministic: the same inputs must always yield the same verdict.
pub trait SignatureScheme: Send + Sync {
    /// Hashes the signing fields of a transaction into the signed message.
    fn hash(&self, fields: &[Felt]) -> Digest {
        Hasher::hash_elements(fields)
    }

    /// Returns true if `signature` is a valid signature of `message` under `public_key`.
    ///
    /// Malformed signatures must be reported as invalid rather than causing a panic.
    fn verify(&self, public_key: &Digest, signature: &[u8], message: Digest) -> bool;
}

// RPO FALCON 512
// ================================================================================================

/// Falcon-512 signatures over RPO digests.
///
/// Account public keys are commitments to Falcon public keys, and signatures use the serialized
/// format of [`Signature`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RpoFalcon512Scheme;

impl SignatureScheme for RpoFalcon512Scheme {
    fn verify(&self, public_key: &Digest, signature: &[u8], message: Digest) -> bool {
        let Ok(signature) = Signature::read_from_bytes(signature) else {
            return false;
        };
        PublicKey::new(Word::from(*public_key)).verify(Word::from(message), &signature)
    }
}
