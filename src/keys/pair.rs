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

//! Schnorr key generation

use crate::errors::MuSigError;
use crate::keys::{PublicKey, SecretKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use k256::elliptic_curve::point::AffineCoordinates;
use k256::elliptic_curve::subtle::ConditionallySelectable;
use k256::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// The length of a secp256k1 Schnorr `Keypair`, in bytes.
pub const KEYPAIR_LENGTH: usize = SECRET_KEY_LENGTH + PUBLIC_KEY_LENGTH;

/// A Schnorr keypair.
///
/// The stored secret is normalized so that `secret * G` is exactly the
/// even-y point named by `public`: constructing a keypair from a secret
/// whose point has odd y negates the secret. Signing code can therefore
/// use the scalar directly against the x-only key.
#[derive(Debug, Clone)]
pub struct Keypair {
    /// The secret half of this keypair.
    pub secret: SecretKey,
    /// The public half of this keypair.
    pub public: PublicKey,
}

impl From<SecretKey> for Keypair {
    fn from(secret: SecretKey) -> Keypair {
        let point = (ProjectivePoint::GENERATOR * secret.as_scalar()).to_affine();

        let negated = -secret.to_scalar();
        let scalar = Scalar::conditional_select(secret.as_scalar(), &negated, point.y_is_odd());

        Keypair {
            secret: SecretKey::from_scalar(scalar),
            public: PublicKey::from_point(point),
        }
    }
}

impl Zeroize for Keypair {
    fn zeroize(&mut self) {
        self.secret.zeroize();
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Keypair {
    /// Convert this keypair to bytes.
    ///
    /// # Returns
    ///
    /// An array of bytes, `[u8; KEYPAIR_LENGTH]`. The first
    /// `SECRET_KEY_LENGTH` of bytes is the `SecretKey`, and the next
    /// `PUBLIC_KEY_LENGTH` bytes is the x-only `PublicKey`.
    pub fn to_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        let mut bytes: [u8; KEYPAIR_LENGTH] = [0u8; KEYPAIR_LENGTH];

        bytes[..SECRET_KEY_LENGTH].copy_from_slice(&self.secret.to_bytes());
        bytes[SECRET_KEY_LENGTH..].copy_from_slice(&self.public.to_bytes());
        bytes
    }

    /// Construct a `Keypair` from the bytes of a `SecretKey` and `PublicKey`.
    ///
    /// The public half is recomputed from the secret and must match the
    /// stored x coordinate, so a keypair assembled from mismatched halves
    /// is rejected rather than silently producing unverifiable signatures.
    pub fn from_bytes(bytes: &[u8]) -> Result<Keypair, MuSigError> {
        if bytes.len() != KEYPAIR_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "Keypair",
                length: KEYPAIR_LENGTH,
            });
        }
        let secret = SecretKey::from_bytes(&bytes[..SECRET_KEY_LENGTH])?;

        let keypair = Keypair::from(secret);
        if keypair.public.to_bytes() != bytes[SECRET_KEY_LENGTH..] {
            return Err(MuSigError::BadArguments);
        }

        Ok(keypair)
    }

    /// Generate a Schnorr keypair.
    ///
    /// # Input
    ///
    /// A CSPRNG with a `fill_bytes()` method, e.g. `rand::rngs::OsRng`.
    pub fn generate<R>(csprng: &mut R) -> Keypair
    where
        R: CryptoRng + RngCore,
    {
        Keypair::from(SecretKey::generate(csprng))
    }

    /// Derive the keypair corresponding to this `SecretKey`.
    pub fn from_secret(s: &SecretKey) -> Keypair {
        Keypair::from(s.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    #[test]
    fn secret_matches_even_y_point() {
        let mut csprng = ChaChaRng::from_seed([9u8; 32]);

        for _ in 0..16 {
            let keypair = Keypair::generate(&mut csprng);
            let point = (ProjectivePoint::GENERATOR * keypair.secret.as_scalar()).to_affine();
            assert!(!bool::from(point.y_is_odd()));
            assert_eq!(PublicKey::from_point(point), keypair.public);
        }
    }

    #[test]
    fn bytes_round_trip_checks_consistency() {
        let mut csprng = ChaChaRng::from_seed([11u8; 32]);
        let keypair = Keypair::generate(&mut csprng);

        let bytes = keypair.to_bytes();
        let again = Keypair::from_bytes(&bytes).unwrap();
        assert_eq!(again.secret, keypair.secret);
        assert_eq!(again.public, keypair.public);

        let mut tampered = bytes;
        tampered[KEYPAIR_LENGTH - 1] ^= 1;
        assert!(Keypair::from_bytes(&tampered).is_err());
    }
}
