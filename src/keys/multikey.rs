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

//! MuSig Key
//!
//! `MultiKey` aggregates the signer set into one x-only key and carries
//! the state every later protocol step needs: the (possibly tweaked)
//! aggregate point, the "second key" used for the coefficient shortcut,
//! the hash binding the ordered key list, the internal key parity, and
//! the accumulated tweak. The state lives in one fixed 165-byte layout
//! behind a magic tag so an uninitialized or corrupted value is caught
//! on every load rather than silently producing garbage signatures.

use crate::errors::MuSigError;
use crate::keys::PublicKey;
use crate::ser::{point_load, point_save};
use crate::tools::{hash_to_scalar, tagged_hash, KEYAGG_COEF_TAG, KEYAGG_LIST_TAG};
use k256::elliptic_curve::ff::{Field, PrimeField};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar, U256};
use sha2::Digest;
use std::fmt::Debug;

/// The length of the serialized `MultiKey` state, in bytes:
/// 4 (magic) + 64 (point) + 32 (second key x) + 32 (key list hash)
/// + 1 (parity) + 32 (tweak).
pub const MULTI_KEY_LENGTH: usize = 165;

/// Tag written during initialization to allow detecting an
/// uninitialized object.
const MULTI_KEY_MAGIC: [u8; 4] = [0xf4, 0xad, 0xbb, 0xdf];

/// MuSig aggregated key state.
#[derive(Clone)]
pub struct MultiKey {
    data: [u8; MULTI_KEY_LENGTH],
}

/// Decoded view of the `MultiKey` layout.
pub(crate) struct MultiKeyInternal {
    /// Aggregate (and potentially tweaked) public key. Not canonicalized.
    pub(crate) pk: AffinePoint,
    /// X-coordinate of the first key differing from key 0, zero if none.
    pub(crate) second_pk_x: [u8; 32],
    /// Hash of the ordered list of public keys.
    pub(crate) pk_hash: [u8; 32],
    /// Parity of the internal key, flipped by tweaking across odd y.
    pub(crate) internal_key_parity: bool,
    /// Accumulated tweak scalar.
    pub(crate) tweak: Scalar,
}

impl Debug for MultiKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "MultiKey( {:?} )", &self.data[..])
    }
}

impl PartialEq for MultiKey {
    fn eq(&self, other: &MultiKey) -> bool {
        self.data[..] == other.data[..]
    }
}

impl Eq for MultiKey {}

/// Returns the `a_i` factor for a component key of the aggregate.
///
/// The key equal to `second_pk_x` gets the constant 1, saving one scalar
/// multiplication; every other key gets the tagged hash of the key list
/// hash and its own x-coordinate.
pub(crate) fn key_agg_coefficient(
    pk_hash: &[u8; 32],
    x: &[u8; 32],
    second_pk_x: &[u8; 32],
) -> Scalar {
    if x == second_pk_x {
        return Scalar::ONE;
    }

    hash_to_scalar(
        tagged_hash(KEYAGG_COEF_TAG)
            .chain_update(pk_hash)
            .chain_update(x),
    )
}

impl MultiKey {
    const DESCRIPTION: &'static str = "MuSig aggregated key state as 165 bytes.";

    /// Constructs a new MuSig multikey aggregating the pubkeys.
    ///
    /// Keys are combined in the order given; permuting the set changes
    /// the aggregate. Duplicates are permitted.
    pub fn new(pubkeys: &[PublicKey]) -> Result<MultiKey, MuSigError> {
        if pubkeys.is_empty() {
            return Err(MuSigError::BadArguments);
        }

        // X-coordinate of the first key that differs from key 0. No
        // point on the curve has an x-coordinate equal to 0, so zero
        // doubles as the "all keys equal" sentinel.
        let first = pubkeys[0].to_bytes();
        let mut second_pk_x = [0u8; 32];
        for pubkey in &pubkeys[1..] {
            let x = pubkey.to_bytes();
            if x != first {
                second_pk_x = x;
                break;
            }
        }

        // <L> = H(X_1 || X_2 || ... || X_n)
        let mut hasher = tagged_hash(KEYAGG_LIST_TAG);
        for pubkey in pubkeys {
            hasher.update(&pubkey.to_bytes());
        }
        let mut pk_hash = [0u8; 32];
        pk_hash.copy_from_slice(&hasher.finalize());

        // aggregated_key = sum_i ( a_i * X_i )
        let mut aggregated_key = ProjectivePoint::IDENTITY;
        for pubkey in pubkeys {
            let a = key_agg_coefficient(&pk_hash, &pubkey.to_bytes(), &second_pk_x);
            aggregated_key += ProjectivePoint::from(*pubkey.as_point()) * a;
        }
        let pk = aggregated_key.to_affine();
        // Infinity here requires the coefficient hashes to cancel.
        debug_assert!(aggregated_key != ProjectivePoint::IDENTITY);

        let mut multikey = MultiKey {
            data: [0u8; MULTI_KEY_LENGTH],
        };
        multikey.save(&MultiKeyInternal {
            pk,
            second_pk_x,
            pk_hash,
            internal_key_parity: false,
            tweak: Scalar::ZERO,
        });

        Ok(multikey)
    }

    /// Returns the x-only, even-y form of the current aggregate key.
    ///
    /// This is the key the final signature verifies under.
    pub fn aggregated_key(&self) -> Result<PublicKey, MuSigError> {
        let internal = self.load()?;
        Ok(PublicKey::from_point(internal.pk))
    }

    /// Returns the current aggregate point without even-y
    /// canonicalization, as a full public key.
    pub fn full_aggregated_key(&self) -> Result<k256::PublicKey, MuSigError> {
        let internal = self.load()?;
        k256::PublicKey::from_affine(internal.pk).map_err(|_| MuSigError::InvalidPoint)
    }

    /// Adds `tweak32 * G` to the aggregate key.
    ///
    /// The accumulated tweak and parity bookkeeping keep partial
    /// signatures consistent with the even-y convention of the final
    /// signature. Tweaks are applied to the running state, so the same
    /// sequence of calls always reproduces the same key.
    ///
    /// Fails with `InvalidScalar` if `tweak32` is not below the group
    /// order and with `TweakAtInfinity` if the tweak exactly cancels the
    /// key; in both cases the state is left untouched.
    pub fn tweak_add(&mut self, tweak32: &[u8; 32]) -> Result<k256::PublicKey, MuSigError> {
        let mut internal = self.load()?;

        let tweak = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*tweak32)))
            .ok_or(MuSigError::InvalidScalar)?;

        // Work on a local copy and commit only on success, so a failed
        // tweak cannot leave the state half-updated.
        if bool::from(internal.pk.y_is_odd()) {
            internal.pk = (-ProjectivePoint::from(internal.pk)).to_affine();
            internal.internal_key_parity = !internal.internal_key_parity;
            internal.tweak = -internal.tweak;
        }
        internal.tweak += tweak;

        let tweaked = ProjectivePoint::from(internal.pk) + ProjectivePoint::GENERATOR * tweak;
        if tweaked == ProjectivePoint::IDENTITY {
            return Err(MuSigError::TweakAtInfinity);
        }
        internal.pk = tweaked.to_affine();

        self.save(&internal);
        k256::PublicKey::from_affine(internal.pk).map_err(|_| MuSigError::InvalidPoint)
    }

    /// Convert this multikey to its byte layout.
    #[inline]
    pub fn to_bytes(&self) -> [u8; MULTI_KEY_LENGTH] {
        self.data
    }

    /// Construct a `MultiKey` from bytes previously produced by
    /// `to_bytes`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<MultiKey, MuSigError> {
        if bytes.len() != MULTI_KEY_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "MultiKey",
                length: MULTI_KEY_LENGTH,
            });
        }

        let mut data = [0u8; MULTI_KEY_LENGTH];
        data.copy_from_slice(bytes);
        let multikey = MultiKey { data };
        multikey.load()?;
        Ok(multikey)
    }

    /// Decode the layout, checking the magic tag.
    pub(crate) fn load(&self) -> Result<MultiKeyInternal, MuSigError> {
        if self.data[..4] != MULTI_KEY_MAGIC {
            return Err(MuSigError::UninitializedCache);
        }

        let mut point = [0u8; 64];
        point.copy_from_slice(&self.data[4..68]);
        let pk = point_load(&point).map_err(|_| MuSigError::UninitializedCache)?;

        let mut second_pk_x = [0u8; 32];
        second_pk_x.copy_from_slice(&self.data[68..100]);
        let mut pk_hash = [0u8; 32];
        pk_hash.copy_from_slice(&self.data[100..132]);
        let internal_key_parity = self.data[132] & 1 == 1;

        let tweak =
            <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::clone_from_slice(&self.data[133..]));

        Ok(MultiKeyInternal {
            pk,
            second_pk_x,
            pk_hash,
            internal_key_parity,
            tweak,
        })
    }

    /// Encode the layout. Requires `internal.pk` to be finite.
    fn save(&mut self, internal: &MultiKeyInternal) {
        self.data[..4].copy_from_slice(&MULTI_KEY_MAGIC);
        self.data[4..68].copy_from_slice(&point_save(&internal.pk));
        self.data[68..100].copy_from_slice(&internal.second_pk_x);
        self.data[100..132].copy_from_slice(&internal.pk_hash);
        self.data[132] = internal.internal_key_parity as u8;
        self.data[133..].copy_from_slice(&internal.tweak.to_bytes());
    }
}

serde_boilerplate!(MultiKey);
