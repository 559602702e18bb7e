pub mod claims;
pub mod codec;
pub mod errors;

pub use claims::TokenClaims;
pub use claims::FINGERPRINT_NEVER_CHANGED;
pub use codec::TokenCodec;
pub use errors::TokenCodecError;
