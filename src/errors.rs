// Copyright 2019 Stichting Organism
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors which may occur while aggregating keys, exchanging nonces,
//! signing or verifying.

use thiserror::Error;

/// Represents an error in key aggregation, nonce handling, signing,
/// or verification.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum MuSigError {
    /// This error occurs when a point is not a valid compressed secp256k1 point
    #[error("Point decoding failed")]
    InvalidPoint,

    /// This error occurs when a scalar is zero or not below the group order
    #[error("Scalar is zero or exceeds the group order")]
    InvalidScalar,

    /// This error occurs when a byte input has the wrong length.
    #[error("{name} must be exactly {length} bytes")]
    BytesLengthError {
        /// The name of the type
        name: &'static str,
        /// The expected byte length
        length: usize,
    },

    /// This error occurs when a function is called with bad arguments.
    #[error("Bad arguments")]
    BadArguments,

    /// The key aggregation cache is uninitialized or its bytes were corrupted
    #[error("Key aggregation cache is uninitialized or corrupt")]
    UninitializedCache,

    /// The tweak summed with the aggregate key is the point at infinity
    #[error("Tweak cancels the aggregate key to infinity")]
    TweakAtInfinity,

    /// The secret nonce was already spent by a previous signing attempt
    #[error("Secret nonce has already been used")]
    NonceReuse,

    /// The secret nonce was generated for a different key or message
    #[error("Secret nonce does not match this keypair or message")]
    KeyMismatch,

    /// A partial signature failed to verify against its public nonce
    #[error("Partial signature verification failed")]
    InvalidPartialSignature,

    /// The final verification equation wasn't satisfied
    #[error("Signature verification failed")]
    InvalidSignature,

    /// Invalid ser provided.
    #[error("Issue When Serilizing Data")]
    SerError,
}

/// Convert `MuSigError` into `::serde::de::Error` aka `SerdeError`
///
/// We should do this with `From` but right now the orphan rules prohibit
/// `impl From<MuSigError> for E where E: ::serde::de::Error`.
pub(crate) fn serde_error_from_musig_error<E>(err: MuSigError) -> E
where E: ::serde::de::Error
{
    match err {
        MuSigError::InvalidPoint
            => E::custom("secp256k1 point decoding failed"),
        MuSigError::InvalidScalar
            => E::custom("improper scalar is zero or exceeds the group order"),
        MuSigError::BytesLengthError { name, length }
            => E::custom(format!("wrong length for {}: expected {} bytes", name, length)),
        MuSigError::UninitializedCache
            => E::custom("key aggregation cache bytes are corrupt"),
        MuSigError::SerError
            => E::custom("improper serde usage"),
        _ => panic!("Non-serialisation error encountered by serde!"),
    }
}
