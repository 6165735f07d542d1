extern crate alloc;

mod accumulator;
pub use accumulator::DeltaAccumulator;

pub mod auth;
pub use auth::{RpoFalcon512Scheme, SignatureScheme};

mod errors;
pub use errors::{BalanceError, RegistryError, VerifierError, VerifierErrorKind};

mod registry;
pub use registry::{AccountStateRegistry, DirtyState};

mod snapshot;
pub use snapshot::StateSnapshot;

mod verifier;
pub use verifier::{OfferRecancelPolicy, TransactionVerifier, VerifierConfig};

#[cfg(any(feature = "testing", test))]
pub mod testing;

#[cfg(test)]
mod tests;

// RE-EXPORTS
// ================================================================================================

pub use rollup_objects::utils;

/// Target of all log events emitted by this crate.
pub const ROLLUP_TX: &str = "rollup-tx";
