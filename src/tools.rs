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

//! The Extra Sauce
//!
//! Tagged hashing in the BIP340 style: every protocol hash is domain
//! separated by prefixing the data with `SHA256(tag) || SHA256(tag)`.
//! Reference implementations bake the prefix into a fixed SHA256
//! midstate; hashing the tag digest twice into a fresh state produces
//! the identical output.

use k256::elliptic_curve::ops::Reduce;
use k256::{Scalar, U256};
use sha2::{Digest, Sha256};

/// Domain tag binding the list of public keys into the key list hash.
pub const KEYAGG_LIST_TAG: &[u8] = b"KeyAgg list";

/// Domain tag for per-key aggregation coefficients.
pub const KEYAGG_COEF_TAG: &[u8] = b"KeyAgg coefficient";

/// Domain tag for secret nonce derivation.
pub const NONCE_TAG: &[u8] = b"MuSig/nonce";

/// Domain tag for the nonce binding coefficient.
pub const NONCE_COEF_TAG: &[u8] = b"MuSig/noncecoef";

/// Domain tag of the single-signer challenge, reused unmodified so the
/// aggregate signature stays indistinguishable from a single-signer one.
pub const CHALLENGE_TAG: &[u8] = b"BIP0340/challenge";

/// Start a tagged hash: a fresh SHA256 state seeded with
/// `SHA256(tag) || SHA256(tag)`.
pub fn tagged_hash(tag: &[u8]) -> Sha256 {
    let tag_hash = Sha256::digest(tag);
    let mut digest = Sha256::new();
    digest.update(tag_hash);
    digest.update(tag_hash);
    digest
}

/// Finalize a tagged hash into a scalar, reduced mod the group order.
pub(crate) fn hash_to_scalar(digest: Sha256) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&digest.finalize())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tagged_hash_is_prefix_separated() {
        let a = tagged_hash(KEYAGG_LIST_TAG).chain_update(b"data").finalize();
        let b = tagged_hash(KEYAGG_COEF_TAG).chain_update(b"data").finalize();
        assert_ne!(a, b);

        // Same tag and data must reproduce the same digest.
        let c = tagged_hash(KEYAGG_LIST_TAG).chain_update(b"data").finalize();
        assert_eq!(a, c);
    }

    #[test]
    fn tagged_hash_matches_double_tag_construction() {
        let tag_hash = Sha256::digest(CHALLENGE_TAG);
        let expected = Sha256::new()
            .chain_update(tag_hash)
            .chain_update(tag_hash)
            .chain_update(b"msg")
            .finalize();
        let got = tagged_hash(CHALLENGE_TAG).chain_update(b"msg").finalize();
        assert_eq!(expected, got);
    }
}
