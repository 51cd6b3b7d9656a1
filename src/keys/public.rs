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

//! Schnorr Public Key generation
//!
//! Public keys are x-only: 32 bytes of big-endian x-coordinate with the
//! even-y point implied, so every key decodes to exactly one point.

use crate::errors::MuSigError;
use crate::keys::SecretKey;
use crate::ser::{lift_x, point_decode, point_encode};
use k256::elliptic_curve::point::AffineCoordinates;
use k256::{AffinePoint, ProjectivePoint};
use std::fmt::Debug;

/// The length of an x-only secp256k1 Schnorr `PublicKey`, in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// A Schnorr public key.
///
/// Invariant: the wrapped point is finite and has even y.
#[derive(Copy, Clone)]
pub struct PublicKey(pub(crate) AffinePoint);

impl Debug for PublicKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "PublicKey( x: {:?} )", &self.to_bytes())
    }
}

impl PublicKey {
    const DESCRIPTION: &'static str = "An x-only secp256k1 public key as 32 bytes.";

    /// Access the point form
    pub fn as_point(&self) -> &AffinePoint {
        &self.0
    }

    /// Extract the point form
    pub fn into_point(self) -> AffinePoint {
        self.0
    }

    /// Wrap a finite point, canonicalizing it to even y.
    pub fn from_point(point: AffinePoint) -> PublicKey {
        if bool::from(point.y_is_odd()) {
            PublicKey((-ProjectivePoint::from(point)).to_affine())
        } else {
            PublicKey(point)
        }
    }

    /// Convert this public key to its x-only byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(&self.0.x());
        bytes
    }

    /// Construct a `PublicKey` from a slice of 32 x-coordinate bytes.
    ///
    /// # Returns
    ///
    /// A `Result` whose okay value is a `PublicKey` or whose error value
    /// is a `MuSigError` describing the error that occurred: the x
    /// coordinate must name a point on the curve.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<PublicKey, MuSigError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "PublicKey",
                length: PUBLIC_KEY_LENGTH,
            });
        }

        let mut x = [0u8; PUBLIC_KEY_LENGTH];
        x.copy_from_slice(bytes);
        Ok(PublicKey(lift_x(&x)?))
    }

    /// Serialize in 33-byte SEC1 compressed form (tag always `0x02`).
    pub fn to_compressed(&self) -> [u8; 33] {
        point_encode(&self.0)
    }

    /// Deserialize from 33-byte SEC1 compressed form.
    pub fn from_compressed(bytes: &[u8; 33]) -> Result<PublicKey, MuSigError> {
        Ok(PublicKey::from_point(point_decode(bytes)?))
    }

    /// Derive this public key from its corresponding `SecretKey`.
    pub fn from_secret(secret_key: &SecretKey) -> PublicKey {
        PublicKey::from_point((ProjectivePoint::GENERATOR * secret_key.as_scalar()).to_affine())
    }
}

impl From<SecretKey> for PublicKey {
    fn from(source: SecretKey) -> PublicKey {
        PublicKey::from_secret(&source)
    }
}

// Ordering Support, byte-wise over the x coordinate.

impl PartialEq for PublicKey {
    fn eq(&self, other: &PublicKey) -> bool {
        self.0 == other.0
    }
}

impl Eq for PublicKey {}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &PublicKey) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

serde_boilerplate!(PublicKey);
