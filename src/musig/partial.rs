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

//! Round two: partial signatures
//!
//! Each signer folds its spent nonce, its key-aggregation coefficient
//! and the session challenge into one scalar. Partial signatures can be
//! checked one by one against the matching public nonce, which is what
//! identifies a misbehaving signer when the sum fails to verify, and
//! their sum (plus the session's tweak term) is the final signature.

use k256::elliptic_curve::ff::PrimeField;
use k256::elliptic_curve::ops::LinearCombination;
use k256::elliptic_curve::point::AffineCoordinates;
use k256::{FieldBytes, ProjectivePoint, Scalar};
use std::fmt::Debug;
use zeroize::Zeroize;

use crate::errors::MuSigError;
use crate::keys::{key_agg_coefficient, Keypair, MultiKey, PublicKey};
use crate::musig::nonce::SecretNonceGuard;
use crate::musig::{PublicNonce, SecretNonce, Session};
use crate::signature::Signature;

/// The length of a serialized `PartialSignature`, in bytes.
pub const PARTIAL_SIGNATURE_LENGTH: usize = 32;

/// One signer's share of the final signature scalar.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct PartialSignature(pub(crate) Scalar);

impl Debug for PartialSignature {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "PartialSignature( s: {:?} )", &self.0)
    }
}

impl PartialSignature {
    const DESCRIPTION: &'static str = "A MuSig partial signature as 32 bytes.";

    /// Convert this partial signature to its 32-byte form.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PARTIAL_SIGNATURE_LENGTH] {
        self.0.to_bytes().into()
    }

    /// Construct a `PartialSignature` from 32 scalar bytes.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<PartialSignature, MuSigError> {
        if bytes.len() != PARTIAL_SIGNATURE_LENGTH {
            return Err(MuSigError::BytesLengthError {
                name: "PartialSignature",
                length: PARTIAL_SIGNATURE_LENGTH,
            });
        }

        let s = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
            .ok_or(MuSigError::InvalidScalar)?;
        Ok(PartialSignature(s))
    }
}

serde_boilerplate!(PartialSignature);

impl Session {
    /// Produce this signer's partial signature.
    ///
    /// The secret nonce is wiped before this function returns, whether
    /// it succeeds or not. Calling again with the same nonce fails with
    /// `NonceReuse`; obtaining a second signature for a key requires a
    /// second nonce from a fresh session id.
    pub fn partial_sign(
        &self,
        secnonce: &mut SecretNonce,
        keypair: &Keypair,
        multikey: &MultiKey,
    ) -> Result<PartialSignature, MuSigError> {
        // From here on every return path wipes the nonce.
        let nonce = SecretNonceGuard::new(secnonce)?;

        if nonce.pubkey != keypair.public.to_bytes() {
            return Err(MuSigError::KeyMismatch);
        }
        if nonce.has_msg && nonce.msg != self.msg {
            return Err(MuSigError::KeyMismatch);
        }

        let internal = multikey.load()?;

        let a = key_agg_coefficient(
            &internal.pk_hash,
            &keypair.public.to_bytes(),
            &internal.second_pk_x,
        );

        // The keypair's scalar already matches the even-y form of the
        // signer key; flip it when the aggregate key's canonicalization
        // and the accumulated internal parity disagree.
        let mut d = keypair.secret.to_scalar();
        if bool::from(internal.pk.y_is_odd()) != internal.internal_key_parity {
            d = -d;
        }

        let mut k1 = nonce.k1;
        let mut k2 = nonce.k2;
        if self.final_nonce_parity {
            k1 = -k1;
            k2 = -k2;
        }

        // s_i = k1 + b * k2 + e * a_i * d_i
        let s = k1 + self.nonce_coefficient * k2 + self.challenge * a * d;

        // zero out the secret scalars
        d.zeroize();
        k1.zeroize();
        k2.zeroize();

        Ok(PartialSignature(s))
    }

    /// Verify one signer's partial signature against its public nonce
    /// and key.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` if the share is valid, and `Err` otherwise. A
    /// failing share is an ordinary protocol outcome pointing at the
    /// signer that must be excluded, not a caller bug.
    pub fn partial_verify(
        &self,
        partial_sig: &PartialSignature,
        pubnonce: &PublicNonce,
        pubkey: &PublicKey,
        multikey: &MultiKey,
    ) -> Result<(), MuSigError> {
        let internal = multikey.load()?;

        // R_i = R_i1 + b * R_i2, negated exactly when the signer negated
        // its nonce scalars.
        let mut nonce_point = ProjectivePoint::from(pubnonce.points[0])
            + ProjectivePoint::from(pubnonce.points[1]) * self.nonce_coefficient;
        if self.final_nonce_parity {
            nonce_point = -nonce_point;
        }

        let a = key_agg_coefficient(&internal.pk_hash, &pubkey.to_bytes(), &internal.second_pk_x);
        let mut ea = self.challenge * a;
        if bool::from(internal.pk.y_is_odd()) != internal.internal_key_parity {
            ea = -ea;
        }

        // s_i * G - e * a_i * P_i == R_i
        let lhs = ProjectivePoint::lincomb(
            &ProjectivePoint::GENERATOR,
            &partial_sig.0,
            &ProjectivePoint::from(*pubkey.as_point()),
            &(-ea),
        );

        if lhs == nonce_point {
            Ok(())
        } else {
            Err(MuSigError::InvalidPartialSignature)
        }
    }

    /// Sum all partial signatures into the final 64-byte signature.
    ///
    /// The shares are not individually verified here; callers either
    /// `partial_verify` each one or rely on verifying the aggregate,
    /// which is cheaper but cannot name the misbehaving signer.
    pub fn partial_sig_agg(
        &self,
        partial_sigs: &[PartialSignature],
    ) -> Result<Signature, MuSigError> {
        if partial_sigs.is_empty() {
            return Err(MuSigError::BadArguments);
        }

        let mut s = self.tweak_part;
        for partial_sig in partial_sigs {
            s += partial_sig.0;
        }

        Ok(Signature {
            R: self.final_nonce_x,
            s,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::musig::AggregateNonce;
    use k256::elliptic_curve::ff::Field;
    use rand::{Rng, RngCore, SeedableRng};
    use rand_chacha::ChaChaRng;

    struct Signer {
        keypair: Keypair,
        secnonce: SecretNonce,
        pubnonce: PublicNonce,
    }

    fn setup<R: RngCore + rand::CryptoRng>(
        n: usize,
        msg: &[u8; 32],
        csprng: &mut R,
    ) -> (Vec<Signer>, MultiKey) {
        let signers: Vec<Signer> = (0..n)
            .map(|_| {
                let keypair = Keypair::generate(csprng);
                let session_id: [u8; 32] = csprng.gen();
                let (secnonce, pubnonce) = SecretNonce::generate(
                    &session_id,
                    Some(&keypair.secret),
                    &keypair.public,
                    Some(msg),
                    None,
                )
                .unwrap();
                Signer {
                    keypair,
                    secnonce,
                    pubnonce,
                }
            })
            .collect();

        let pubkeys: Vec<_> = signers.iter().map(|signer| signer.keypair.public).collect();
        let multikey = MultiKey::new(&pubkeys).unwrap();
        (signers, multikey)
    }

    fn sign_all(
        signers: &mut [Signer],
        multikey: &MultiKey,
        session: &Session,
    ) -> Vec<PartialSignature> {
        signers
            .iter_mut()
            .map(|signer| {
                session
                    .partial_sign(&mut signer.secnonce, &signer.keypair, multikey)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn full_round_verifies_for_small_groups() {
        let mut csprng = ChaChaRng::from_seed([51u8; 32]);

        for n in 1..=3 {
            let msg: [u8; 32] = csprng.gen();
            let (mut signers, multikey) = setup(n, &msg, &mut csprng);

            let pubnonces: Vec<_> = signers.iter().map(|signer| signer.pubnonce).collect();
            let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
            let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();

            let partial_sigs = sign_all(&mut signers, &multikey, &session);
            for (signer, partial_sig) in signers.iter().zip(&partial_sigs) {
                session
                    .partial_verify(
                        partial_sig,
                        &signer.pubnonce,
                        &signer.keypair.public,
                        &multikey,
                    )
                    .unwrap();
            }

            let signature = session.partial_sig_agg(&partial_sigs).unwrap();
            signature
                .verify(&msg, &multikey.aggregated_key().unwrap())
                .unwrap();
        }
    }

    #[test]
    fn round_with_tweaks_verifies() {
        let mut csprng = ChaChaRng::from_seed([52u8; 32]);
        let msg: [u8; 32] = csprng.gen();
        let (mut signers, mut multikey) = setup(3, &msg, &mut csprng);

        // Two tweaks so at least the accumulator is exercised beyond the
        // trivial case, whatever the intermediate parities are.
        for byte in 1u8..3 {
            let mut tweak = [0u8; 32];
            tweak[31] = byte;
            multikey.tweak_add(&tweak).unwrap();
        }

        let pubnonces: Vec<_> = signers.iter().map(|signer| signer.pubnonce).collect();
        let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
        let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();

        let partial_sigs = sign_all(&mut signers, &multikey, &session);
        for (signer, partial_sig) in signers.iter().zip(&partial_sigs) {
            session
                .partial_verify(
                    partial_sig,
                    &signer.pubnonce,
                    &signer.keypair.public,
                    &multikey,
                )
                .unwrap();
        }

        let signature = session.partial_sig_agg(&partial_sigs).unwrap();
        signature
            .verify(&msg, &multikey.aggregated_key().unwrap())
            .unwrap();
    }

    #[test]
    fn nonce_is_spent_by_signing() {
        let mut csprng = ChaChaRng::from_seed([53u8; 32]);
        let msg: [u8; 32] = csprng.gen();
        let (mut signers, multikey) = setup(2, &msg, &mut csprng);

        let pubnonces: Vec<_> = signers.iter().map(|signer| signer.pubnonce).collect();
        let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
        let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();

        let signer = &mut signers[0];
        session
            .partial_sign(&mut signer.secnonce, &signer.keypair, &multikey)
            .unwrap();

        // The nonce is gone: the scalars are zero and a second attempt
        // fails before touching any secret material.
        assert_eq!(signer.secnonce.k1, Scalar::ZERO);
        assert_eq!(signer.secnonce.k2, Scalar::ZERO);
        assert_eq!(
            session.partial_sign(&mut signer.secnonce, &signer.keypair, &multikey),
            Err(MuSigError::NonceReuse)
        );
    }

    #[test]
    fn nonce_is_spent_even_when_signing_fails() {
        let mut csprng = ChaChaRng::from_seed([54u8; 32]);
        let msg: [u8; 32] = csprng.gen();
        let (mut signers, multikey) = setup(2, &msg, &mut csprng);

        let pubnonces: Vec<_> = signers.iter().map(|signer| signer.pubnonce).collect();
        let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
        let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();

        // Signing with the wrong keypair is rejected, but the nonce must
        // still be dead afterwards.
        let stranger = Keypair::generate(&mut csprng);
        let signer = &mut signers[0];
        assert_eq!(
            session.partial_sign(&mut signer.secnonce, &stranger, &multikey),
            Err(MuSigError::KeyMismatch)
        );
        assert_eq!(
            session.partial_sign(&mut signer.secnonce, &signer.keypair, &multikey),
            Err(MuSigError::NonceReuse)
        );
    }

    #[test]
    fn mismatched_message_is_rejected() {
        let mut csprng = ChaChaRng::from_seed([55u8; 32]);
        let msg: [u8; 32] = csprng.gen();
        let (mut signers, multikey) = setup(2, &msg, &mut csprng);

        let pubnonces: Vec<_> = signers.iter().map(|signer| signer.pubnonce).collect();
        let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();

        let mut other_msg = msg;
        other_msg[7] ^= 0x80;
        let session = Session::new(&multikey, &aggnonce, &other_msg, None).unwrap();

        // The nonces were bound to `msg` at generation time.
        let signer = &mut signers[0];
        assert_eq!(
            session.partial_sign(&mut signer.secnonce, &signer.keypair, &multikey),
            Err(MuSigError::KeyMismatch)
        );
    }

    #[test]
    fn corrupted_share_is_caught_and_breaks_the_sum() {
        let mut csprng = ChaChaRng::from_seed([56u8; 32]);
        let msg: [u8; 32] = csprng.gen();
        let (mut signers, multikey) = setup(3, &msg, &mut csprng);

        let pubnonces: Vec<_> = signers.iter().map(|signer| signer.pubnonce).collect();
        let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
        let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();

        let mut partial_sigs = sign_all(&mut signers, &multikey, &session);

        // Flip the last byte of one share.
        let mut bytes = partial_sigs[1].to_bytes();
        bytes[31] ^= 1;
        partial_sigs[1] = PartialSignature::from_bytes(&bytes).unwrap();

        assert_eq!(
            session.partial_verify(
                &partial_sigs[1],
                &signers[1].pubnonce,
                &signers[1].keypair.public,
                &multikey,
            ),
            Err(MuSigError::InvalidPartialSignature)
        );

        let signature = session.partial_sig_agg(&partial_sigs).unwrap();
        assert!(signature
            .verify(&msg, &multikey.aggregated_key().unwrap())
            .is_err());
    }

    #[test]
    fn aggregation_requires_at_least_one_share() {
        let mut csprng = ChaChaRng::from_seed([57u8; 32]);
        let msg: [u8; 32] = csprng.gen();
        let (signers, multikey) = setup(1, &msg, &mut csprng);

        let aggnonce = AggregateNonce::combine(&[signers[0].pubnonce]).unwrap();
        let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();
        assert_eq!(
            session.partial_sig_agg(&[]),
            Err(MuSigError::BadArguments)
        );
    }
}
