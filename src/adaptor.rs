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

//! Adaptor Signatures
//!
//! https://joinmarket.me/blog/blog/flipping-the-scriptless-script-on-schnorr/
//!
//! A signing session run with an adaptor point `T = t*G` produces a
//! pre-signature that fails ordinary verification. Whoever knows `t`
//! can complete it into a valid signature, and anyone holding both the
//! pre-signature and the completed signature recovers `t`. That is the
//! primitive atomic swaps and other conditional-payment contracts are
//! built from: publishing the signature *is* revealing the secret.
//!
//! The session's nonce parity must be threaded through, because the
//! final nonce (including `T`) may have been negated for even y, in
//! which case the adaptor enters the scalar with the opposite sign.

use k256::elliptic_curve::ff::PrimeField;
use k256::{FieldBytes, Scalar};

use crate::errors::MuSigError;
use crate::signature::Signature;

/// Complete a pre-signature with the secret adaptor.
///
/// `nonce_parity` is the value of [`crate::Session::nonce_parity`] for
/// the session that produced the pre-signature.
pub fn adapt(
    pre_signature: &Signature,
    sec_adaptor32: &[u8; 32],
    nonce_parity: bool,
) -> Result<Signature, MuSigError> {
    let mut t = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(*sec_adaptor32)))
        .ok_or(MuSigError::InvalidScalar)?;

    if nonce_parity {
        t = -t;
    }

    Ok(Signature {
        R: pre_signature.R,
        s: pre_signature.s + t,
    })
}

/// Recover the secret adaptor from a completed signature and the
/// pre-signature it was completed from.
pub fn extract_adaptor(
    signature: &Signature,
    pre_signature: &Signature,
    nonce_parity: bool,
) -> Result<[u8; 32], MuSigError> {
    let mut t = signature.s - pre_signature.s;
    if nonce_parity {
        t = -t;
    }

    Ok(t.to_bytes().into())
}
