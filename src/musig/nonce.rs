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

//! Round one: nonces
//!
//! Each signer derives a pair of secret scalars from a fresh random
//! session id and publishes the matching pair of points. The session id
//! is the sole input the nonce-reuse safety of the whole protocol rests
//! on: generating two nonces from the same session id and signing with
//! the same key hands the secret key to anyone who sees both partial
//! signatures. Key, message and extra input are mixed in as
//! defense-in-depth only.

use core::ops::Deref;
use std::fmt::Debug;

use k256::elliptic_curve::ff::Field;
use k256::{AffinePoint, ProjectivePoint, Scalar};
use sha2::Digest;
use zeroize::Zeroize;

use crate::errors::MuSigError;
use crate::keys::{PublicKey, SecretKey};
use crate::ser::{point_decode, point_encode};
use crate::tools::{hash_to_scalar, tagged_hash, NONCE_TAG};

/// The length of a serialized `PublicNonce`, in bytes.
pub const PUBLIC_NONCE_LENGTH: usize = 66;

/// Tag marking a secret nonce that has not been spent yet. Invalidation
/// clears it, so a spent nonce is distinguishable from a live one.
const SECRET_NONCE_MAGIC: [u8; 4] = [0x8b, 0x03, 0x5a, 0xc1];

/// A single-use pair of secret nonce scalars.
///
/// Opaque: there is deliberately no byte codec, since a secret nonce
/// must never be persisted or transmitted. It is spent by exactly one
/// `partial_sign` call and wiped on drop.
pub struct SecretNonce {
    pub(crate) magic: [u8; 4],
    pub(crate) k1: Scalar,
    pub(crate) k2: Scalar,
    /// X-only bytes of the signer key this nonce was derived for.
    pub(crate) pubkey: [u8; 32],
    /// Message fingerprint: `has_msg` distinguishes "generated without a
    /// message" from a message of all zero bytes.
    pub(crate) has_msg: bool,
    pub(crate) msg: [u8; 32],
}

impl Debug for SecretNonce {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "SecretNonce: <secret>")
    }
}

impl Zeroize for SecretNonce {
    fn zeroize(&mut self) {
        self.magic.zeroize();
        self.k1.zeroize();
        self.k2.zeroize();
        self.pubkey.zeroize();
        self.has_msg = false;
        self.msg.zeroize();
    }
}

impl Drop for SecretNonce {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Derive one of the two nonce scalars. The optional inputs are framed
/// with presence markers and lengths so distinct input combinations can
/// never collide on the same hash preimage.
fn derive_nonce_scalar(
    session_id: &[u8; 32],
    seckey: Option<&SecretKey>,
    pubkey: &PublicKey,
    msg32: Option<&[u8; 32]>,
    extra_input: Option<&[u8]>,
    index: u8,
) -> Result<Scalar, MuSigError> {
    let mut hasher = tagged_hash(NONCE_TAG);
    hasher.update(session_id);
    hasher.update(&pubkey.to_bytes());

    match msg32 {
        None => hasher.update(&[0u8]),
        Some(msg) => {
            hasher.update(&[1u8]);
            hasher.update(&(msg.len() as u64).to_be_bytes());
            hasher.update(msg);
        }
    }
    match extra_input {
        None => hasher.update(&[0u8]),
        Some(extra) => {
            hasher.update(&[1u8]);
            hasher.update(&(extra.len() as u64).to_be_bytes());
            hasher.update(extra);
        }
    }
    match seckey {
        None => hasher.update(&[0u8]),
        Some(seckey) => {
            hasher.update(&[1u8]);
            hasher.update(&seckey.to_bytes());
        }
    }
    hasher.update(&[index]);

    let k = hash_to_scalar(hasher);
    // A zero nonce would make the public nonce the point at infinity.
    if bool::from(k.is_zero()) {
        return Err(MuSigError::InvalidScalar);
    }
    Ok(k)
}

impl SecretNonce {
    /// Derive a secret/public nonce pair for one signing session.
    ///
    /// `session_id` MUST be fresh uniform randomness, unique per call.
    /// Passing the signing key and message here only hardens the
    /// derivation; it does not make session id reuse survivable.
    pub fn generate(
        session_id: &[u8; 32],
        seckey: Option<&SecretKey>,
        pubkey: &PublicKey,
        msg32: Option<&[u8; 32]>,
        extra_input: Option<&[u8]>,
    ) -> Result<(SecretNonce, PublicNonce), MuSigError> {
        let k1 = derive_nonce_scalar(session_id, seckey, pubkey, msg32, extra_input, 0)?;
        let k2 = derive_nonce_scalar(session_id, seckey, pubkey, msg32, extra_input, 1)?;

        let pubnonce = PublicNonce {
            points: [
                (ProjectivePoint::GENERATOR * k1).to_affine(),
                (ProjectivePoint::GENERATOR * k2).to_affine(),
            ],
        };

        let secnonce = SecretNonce {
            magic: SECRET_NONCE_MAGIC,
            k1,
            k2,
            pubkey: pubkey.to_bytes(),
            has_msg: msg32.is_some(),
            msg: msg32.copied().unwrap_or([0u8; 32]),
        };

        Ok((secnonce, pubnonce))
    }
}

/// Spend-once guard around a `SecretNonce`.
///
/// Creating the guard checks the nonce is still live; dropping it wipes
/// the nonce. Signing reads the scalars through the guard, so every
/// path out of the signing function, including the error paths, leaves
/// the nonce invalidated.
pub(crate) struct SecretNonceGuard<'a> {
    nonce: &'a mut SecretNonce,
}

impl<'a> SecretNonceGuard<'a> {
    pub(crate) fn new(nonce: &'a mut SecretNonce) -> Result<SecretNonceGuard<'a>, MuSigError> {
        if nonce.magic != SECRET_NONCE_MAGIC {
            return Err(MuSigError::NonceReuse);
        }
        Ok(SecretNonceGuard { nonce })
    }
}

impl<'a> Deref for SecretNonceGuard<'a> {
    type Target = SecretNonce;

    fn deref(&self) -> &SecretNonce {
        self.nonce
    }
}

impl<'a> Drop for SecretNonceGuard<'a> {
    fn drop(&mut self) {
        self.nonce.zeroize();
    }
}

/// One signer's pair of public nonce points, exchanged before signing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PublicNonce {
    pub(crate) points: [AffinePoint; 2],
}

impl PublicNonce {
    const DESCRIPTION: &'static str = "A MuSig public nonce as 2 x 33 bytes.";

    /// Convert this nonce to its 66-byte serialized form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_NONCE_LENGTH] {
        let mut bytes = [0u8; PUBLIC_NONCE_LENGTH];
        bytes[..33].copy_from_slice(&point_encode(&self.points[0]));
        bytes[33..].copy_from_slice(&point_encode(&self.points[1]));
        bytes
    }

    /// Construct a `PublicNonce` from two compressed points.
    pub fn from_bytes(bytes: &[u8]) -> Result<PublicNonce, MuSigError> {
        if bytes.len() != PUBLIC_NONCE_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "PublicNonce",
                length: PUBLIC_NONCE_LENGTH,
            });
        }

        let mut first = [0u8; 33];
        first.copy_from_slice(&bytes[..33]);
        let mut second = [0u8; 33];
        second.copy_from_slice(&bytes[33..]);

        Ok(PublicNonce {
            points: [point_decode(&first)?, point_decode(&second)?],
        })
    }
}

serde_boilerplate!(PublicNonce);

/// The slot-wise sum of all signers' public nonces.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AggregateNonce {
    pub(crate) points: [AffinePoint; 2],
}

impl AggregateNonce {
    const DESCRIPTION: &'static str = "A MuSig aggregate nonce as 2 x 33 bytes.";

    /// Sum the public nonces of all signers, slot by slot.
    ///
    /// An adversary controlling some signers can force either sum to the
    /// point at infinity, which has no compressed encoding and would
    /// poison the arithmetic downstream. Such a sum is replaced with the
    /// generator: a fixed public substitution every signer computes
    /// identically, and the honest signers' signature simply fails to
    /// verify if the nonces were manipulated.
    pub fn combine(pubnonces: &[PublicNonce]) -> Result<AggregateNonce, MuSigError> {
        if pubnonces.is_empty() {
            return Err(MuSigError::BadArguments);
        }

        let mut points = [AffinePoint::IDENTITY; 2];
        for slot in 0..2 {
            let mut sum = ProjectivePoint::IDENTITY;
            for pubnonce in pubnonces {
                sum += ProjectivePoint::from(pubnonce.points[slot]);
            }
            if sum == ProjectivePoint::IDENTITY {
                sum = ProjectivePoint::GENERATOR;
            }
            points[slot] = sum.to_affine();
        }

        Ok(AggregateNonce { points })
    }

    /// Convert this nonce to its 66-byte serialized form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_NONCE_LENGTH] {
        let mut bytes = [0u8; PUBLIC_NONCE_LENGTH];
        bytes[..33].copy_from_slice(&point_encode(&self.points[0]));
        bytes[33..].copy_from_slice(&point_encode(&self.points[1]));
        bytes
    }

    /// Construct an `AggregateNonce` from two compressed points.
    pub fn from_bytes(bytes: &[u8]) -> Result<AggregateNonce, MuSigError> {
        if bytes.len() != PUBLIC_NONCE_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "AggregateNonce",
                length: PUBLIC_NONCE_LENGTH,
            });
        }

        let mut first = [0u8; 33];
        first.copy_from_slice(&bytes[..33]);
        let mut second = [0u8; 33];
        second.copy_from_slice(&bytes[33..]);

        Ok(AggregateNonce {
            points: [point_decode(&first)?, point_decode(&second)?],
        })
    }
}

serde_boilerplate!(AggregateNonce);
