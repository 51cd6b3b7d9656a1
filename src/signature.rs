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

//! The aggregate Schnorr signature
//!
//! The output of a completed signing session is indistinguishable from
//! a single-signer signature under the aggregate key: 32 bytes of
//! final-nonce x-coordinate followed by 32 bytes of scalar. Verification
//! is delegated to the single-signer scheme.

use k256::elliptic_curve::ff::PrimeField;
use k256::{FieldBytes, Scalar};
use std::convert::TryFrom;
use std::fmt::Debug;

use crate::errors::MuSigError;
use crate::keys::PublicKey;

/// The length of a Schnorr `Signature`, in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// A Schnorr signature.
///
/// # Note
///
/// These signatures are "detached"—that is, they do **not** include a copy
/// of the message which has been signed.
#[allow(non_snake_case)]
#[derive(Copy, Eq, PartialEq)]
pub struct Signature {
    /// `R` is the x-coordinate of the final nonce point, canonically
    /// the point with even y.
    pub(crate) R: [u8; 32],

    /// `s` is a `Scalar`: the sum of every signer's partial signature,
    /// plus the tweak term, plus the adaptor term when one is in play.
    pub(crate) s: Scalar,
}

impl Clone for Signature {
    fn clone(&self) -> Self {
        *self
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "Signature( R: {:?}, s: {:?} )", &self.R, &self.s)
    }
}

impl Signature {
    const DESCRIPTION: &'static str = "A 64-byte Schnorr signature.";

    /// Convert this signature to its 64-byte form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.R);
        bytes[32..].copy_from_slice(&self.s.to_bytes());
        bytes
    }

    /// Construct a `Signature` from 64 bytes.
    ///
    /// The scalar half must be below the group order; the nonce half is
    /// only checked by verification.
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature, MuSigError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "Signature",
                length: SIGNATURE_LENGTH,
            });
        }

        #[allow(non_snake_case)]
        let mut R = [0u8; 32];
        R.copy_from_slice(&bytes[..32]);

        let s = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(
            &bytes[32..],
        )))
        .ok_or(MuSigError::InvalidScalar)?;

        Ok(Signature { R, s })
    }

    /// Verify this signature on a message with the given x-only key.
    ///
    /// Uses the ordinary single-signer verification; an aggregate key is
    /// just a public key here.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` if the signature is valid, and `Err` otherwise.
    pub fn verify(&self, msg: &[u8], public_key: &PublicKey) -> Result<(), MuSigError> {
        let verifying_key = k256::schnorr::VerifyingKey::from_bytes(&public_key.to_bytes())
            .map_err(|_| MuSigError::InvalidPoint)?;
        let signature = k256::schnorr::Signature::try_from(&self.to_bytes()[..])
            .map_err(|_| MuSigError::InvalidSignature)?;

        verifying_key
            .verify_raw(msg, &signature)
            .map_err(|_| MuSigError::InvalidSignature)
    }
}

serde_boilerplate!(Signature);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&[0xab; 32]);
        bytes[63] = 9;

        let sig = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(sig.to_bytes(), bytes);
    }

    #[test]
    fn rejects_overflowing_scalar_half() {
        let bytes = [0xff; SIGNATURE_LENGTH];
        assert_eq!(
            Signature::from_bytes(&bytes),
            Err(MuSigError::InvalidScalar)
        );
        assert!(matches!(
            Signature::from_bytes(&bytes[..63]),
            Err(MuSigError::BytesLengthError { .. })
        ));
    }

    #[test]
    fn verifies_single_signer_output() {
        // A signature produced by the single-signer scheme must verify
        // through this wrapper, since the formats coincide.
        use k256::schnorr::signature::{SignatureEncoding, Signer};

        let signing_key = k256::schnorr::SigningKey::from_bytes(&[7u8; 32]).unwrap();
        let msg = [3u8; 32];
        let sig: k256::schnorr::Signature = signing_key.sign(&msg);

        let public_key =
            crate::keys::PublicKey::from_bytes(&signing_key.verifying_key().to_bytes()).unwrap();
        let wrapped = Signature::from_bytes(&sig.to_bytes()).unwrap();
        assert!(wrapped.verify(&msg, &public_key).is_ok());

        let mut bad = sig.to_bytes();
        bad[63] ^= 1;
        let wrapped_bad = Signature::from_bytes(&bad).unwrap();
        assert!(wrapped_bad.verify(&msg, &public_key).is_err());
    }
}
