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

//! The boundary between the two communication rounds
//!
//! Once every signer's public nonce is in, processing the aggregate
//! nonce against a message and an aggregated key fixes everything the
//! signing equation needs: the coefficient binding the second nonce
//! slot, the final nonce point and its parity, and the challenge. A
//! `Session` is immutable once created and is shared by all of that
//! message's partial signature operations.

use k256::elliptic_curve::ff::Field;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::{ProjectivePoint, Scalar};
use sha2::Digest;

use crate::errors::MuSigError;
use crate::keys::{MultiKey, PublicKey};
use crate::musig::AggregateNonce;
use crate::tools::{hash_to_scalar, tagged_hash, CHALLENGE_TAG, NONCE_COEF_TAG};

/// Per-message signing state derived from the aggregate nonce.
#[derive(Clone, Debug)]
pub struct Session {
    /// Coefficient `b` binding the second nonce slot to this session.
    pub(crate) nonce_coefficient: Scalar,
    /// X-coordinate of the final nonce, first half of the signature.
    pub(crate) final_nonce_x: [u8; 32],
    /// Whether the final nonce needed negation for even y.
    pub(crate) final_nonce_parity: bool,
    /// Single-signer challenge `e` over the final nonce and aggregate key.
    pub(crate) challenge: Scalar,
    /// The tweak's contribution to the final scalar, added once at
    /// aggregation rather than by each signer.
    pub(crate) tweak_part: Scalar,
    /// The 32-byte message being signed.
    pub(crate) msg: [u8; 32],
}

impl Session {
    /// Process an aggregate nonce into the session for `msg32`.
    ///
    /// The optional adaptor point is folded into the final nonce, which
    /// is what turns the aggregated output into a pre-signature that
    /// only becomes valid once the adaptor secret is applied.
    pub fn new(
        multikey: &MultiKey,
        aggnonce: &AggregateNonce,
        msg32: &[u8; 32],
        adaptor: Option<&k256::PublicKey>,
    ) -> Result<Session, MuSigError> {
        let internal = multikey.load()?;
        let agg_pk_x = PublicKey::from_point(internal.pk).to_bytes();

        // b = H(aggnonce, X, m), binding both nonce slots to this session.
        let nonce_coefficient = hash_to_scalar(
            tagged_hash(NONCE_COEF_TAG)
                .chain_update(&aggnonce.to_bytes())
                .chain_update(&agg_pk_x)
                .chain_update(msg32),
        );

        // R = R1 + b * R2 (+ T)
        let mut final_nonce = ProjectivePoint::from(aggnonce.points[0])
            + ProjectivePoint::from(aggnonce.points[1]) * nonce_coefficient;
        if let Some(adaptor) = adaptor {
            final_nonce += adaptor.to_projective();
        }
        // Same substitution as nonce aggregation: adversarial nonces can
        // cancel to infinity, which must not crash the round. The
        // resulting signature just fails verification.
        if final_nonce == ProjectivePoint::IDENTITY {
            final_nonce = ProjectivePoint::GENERATOR;
        }

        let final_nonce = final_nonce.to_affine();
        let final_nonce_parity = bool::from(final_nonce.y_is_odd());
        let mut final_nonce_x = [0u8; 32];
        final_nonce_x.copy_from_slice(&final_nonce.x());

        // e = H(R.x, X, m), the unmodified single-signer challenge.
        let challenge = hash_to_scalar(
            tagged_hash(CHALLENGE_TAG)
                .chain_update(&final_nonce_x)
                .chain_update(&agg_pk_x)
                .chain_update(msg32),
        );

        // If the key was tweaked, `e * tweak` belongs to the final
        // scalar; its sign follows the aggregate key's canonicalization.
        let mut tweak_part = Scalar::ZERO;
        if !bool::from(internal.tweak.is_zero()) {
            tweak_part = challenge * internal.tweak;
            if bool::from(internal.pk.y_is_odd()) {
                tweak_part = -tweak_part;
            }
        }

        Ok(Session {
            nonce_coefficient,
            final_nonce_x,
            final_nonce_parity,
            challenge,
            tweak_part,
            msg: *msg32,
        })
    }

    /// Whether the final nonce was negated for even y.
    ///
    /// Only meaningful to callers of the adaptor extension, which must
    /// know the sign to apply and extract the adaptor secret. It has no
    /// use in plain signing.
    pub fn nonce_parity(&self) -> bool {
        self.final_nonce_parity
    }
}
