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

//! Schnorr Secret Key generation

use core::fmt::Debug;
use k256::elliptic_curve::ff::{Field, PrimeField};
use k256::{FieldBytes, Scalar};
use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::errors::MuSigError;

/// The length of a secp256k1 Schnorr `SecretKey`, in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// A Schnorr secret key: a nonzero scalar below the group order.
#[derive(Clone)]
pub struct SecretKey(pub(crate) Scalar);

impl Debug for SecretKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "SecretKey: <secret>")
    }
}

impl Eq for SecretKey {}
impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).unwrap_u8() == 1u8
    }
}
impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Overwrite secret key material with null bytes when it goes out of scope.
impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl SecretKey {
    const DESCRIPTION: &'static str = "A secp256k1 secret key as 32 bytes.";

    /// Convert this secret key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0.to_bytes().into()
    }

    /// Construct a `SecretKey` from a slice of 32 big-endian bytes.
    ///
    /// # Returns
    ///
    /// A `Result` whose okay value is a `SecretKey` or whose error value
    /// is a `MuSigError` wrapping the internal error that occurred.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<SecretKey, MuSigError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "SecretKey",
                length: SECRET_KEY_LENGTH,
            });
        }

        let scalar = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
            .ok_or(MuSigError::InvalidScalar)?;
        if bool::from(scalar.is_zero()) {
            return Err(MuSigError::InvalidScalar);
        }

        Ok(SecretKey(scalar))
    }

    /// Generate a `SecretKey` from a `csprng`.
    ///
    /// Rejection samples 32-byte strings until one is a valid nonzero
    /// scalar. The probability that a draw is rejected is about 2^-128.
    pub fn generate<T>(csprng: &mut T) -> SecretKey
    where
        T: CryptoRng + RngCore,
    {
        loop {
            let mut bytes = [0u8; SECRET_KEY_LENGTH];
            csprng.fill_bytes(&mut bytes);
            if let Ok(key) = SecretKey::from_bytes(&bytes) {
                bytes.zeroize();
                return key;
            }
        }
    }

    /// Helper Method to Convert key to scalar
    pub fn to_scalar(&self) -> Scalar {
        self.0
    }

    /// View this secret key as a scalar.
    #[inline]
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// Helper Method to Convert Scalar to Key
    pub fn from_scalar(s: Scalar) -> SecretKey {
        SecretKey(s)
    }
}

serde_boilerplate!(SecretKey);
