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

//! Serde Support & point codec
//!
//! The point codec serializes finite curve points into the fixed layout
//! used by the key aggregation cache: 32-byte big-endian x followed by
//! 32-byte big-endian y. The point at infinity has no encoding in this
//! layout; callers guarantee finiteness by construction.

use crate::errors::MuSigError;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{AffinePoint, EncodedPoint, FieldBytes};

macro_rules! serde_boilerplate { ($t:ty) => {
    impl ::serde::Serialize for $t {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: ::serde::Serializer {
            serializer.serialize_bytes(&self.to_bytes()[..])
        }
    }

    impl<'d> ::serde::Deserialize<'d> for $t {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: ::serde::Deserializer<'d> {
            struct MyVisitor;

            impl<'d> ::serde::de::Visitor<'d> for MyVisitor {
                type Value = $t;

                fn expecting(&self, formatter: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    formatter.write_str(Self::Value::DESCRIPTION)
                }

                fn visit_bytes<E>(self, bytes: &[u8]) -> Result<$t, E> where E: ::serde::de::Error {
                    Self::Value::from_bytes(bytes).map_err(crate::errors::serde_error_from_musig_error)
                }
            }
            deserializer.deserialize_bytes(MyVisitor)
        }
    }
} } // macro_rules! serde_boilerplate

/// Serialize a finite point as 64 bytes of big-endian (x, y).
pub(crate) fn point_save(point: &AffinePoint) -> [u8; 64] {
    let encoded = point.to_encoded_point(false);
    debug_assert_eq!(encoded.len(), 65);

    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&encoded.as_bytes()[1..65]);
    bytes
}

/// Deserialize a point stored by `point_save`.
pub(crate) fn point_load(bytes: &[u8; 64]) -> Result<AffinePoint, MuSigError> {
    let x = FieldBytes::clone_from_slice(&bytes[..32]);
    let y = FieldBytes::clone_from_slice(&bytes[32..]);
    let encoded = EncodedPoint::from_affine_coordinates(&x, &y, false);

    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(MuSigError::InvalidPoint)
}

/// Decode a 32-byte x-only key into the canonical even-y point.
pub(crate) fn lift_x(x: &[u8; 32]) -> Result<AffinePoint, MuSigError> {
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(x);
    point_decode(&compressed)
}

/// Serialize a finite point in 33-byte SEC1 compressed form.
pub(crate) fn point_encode(point: &AffinePoint) -> [u8; 33] {
    let encoded = point.to_encoded_point(true);
    debug_assert_eq!(encoded.len(), 33);

    let mut bytes = [0u8; 33];
    bytes.copy_from_slice(encoded.as_bytes());
    bytes
}

/// Deserialize a 33-byte SEC1 compressed point.
pub(crate) fn point_decode(bytes: &[u8; 33]) -> Result<AffinePoint, MuSigError> {
    let encoded = EncodedPoint::from_bytes(&bytes[..]).map_err(|_| MuSigError::InvalidPoint)?;

    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(MuSigError::InvalidPoint)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::{Keypair, MultiKey, PublicKey, SecretKey};
    use crate::musig::{AggregateNonce, SecretNonce};
    use crate::signature::Signature;
    use k256::elliptic_curve::point::AffineCoordinates;
    use k256::ProjectivePoint;
    use k256::Scalar;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    #[test]
    fn point_codec_round_trip() {
        let point = (ProjectivePoint::GENERATOR * Scalar::from(42u64)).to_affine();

        let saved = point_save(&point);
        let loaded = point_load(&saved).unwrap();
        assert_eq!(point, loaded);

        let compressed = point_encode(&point);
        let decoded = point_decode(&compressed).unwrap();
        assert_eq!(point, decoded);
    }

    #[test]
    fn point_load_rejects_off_curve() {
        // (1, 1) does not satisfy the curve equation.
        let mut bytes = [0u8; 64];
        bytes[31] = 1;
        bytes[63] = 1;
        assert_eq!(point_load(&bytes), Err(MuSigError::InvalidPoint));
    }

    #[test]
    fn serialize_deserialize_public_key() {
        let mut csprng = ChaChaRng::from_seed([71u8; 32]);
        let public_key = PublicKey::from_secret(&SecretKey::generate(&mut csprng));

        let encoded: Vec<u8> = bincode::serialize(&public_key).unwrap();
        // Size specific to bincode==1: 8-byte length prefix.
        assert_eq!(encoded.len(), 32 + 8);
        let decoded: PublicKey = bincode::deserialize(&encoded).unwrap();
        assert_eq!(public_key, decoded);
    }

    #[test]
    fn serialize_deserialize_signature() {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&[0x42; 32]);
        bytes[62] = 1;
        let signature = Signature::from_bytes(&bytes).unwrap();

        let encoded: Vec<u8> = bincode::serialize(&signature).unwrap();
        assert_eq!(encoded.len(), 64 + 8);
        let decoded: Signature = bincode::deserialize(&encoded).unwrap();
        assert_eq!(signature, decoded);
    }

    #[test]
    fn serialize_deserialize_multikey_and_nonce() {
        let mut csprng = ChaChaRng::from_seed([72u8; 32]);
        let keypair = Keypair::generate(&mut csprng);
        let multikey = MultiKey::new(&[keypair.public]).unwrap();

        let encoded = bincode::serialize(&multikey).unwrap();
        let decoded: MultiKey = bincode::deserialize(&encoded).unwrap();
        assert_eq!(multikey, decoded);

        let (_, pubnonce) =
            SecretNonce::generate(&[1u8; 32], None, &keypair.public, None, None).unwrap();
        let aggnonce = AggregateNonce::combine(&[pubnonce]).unwrap();
        let encoded = bincode::serialize(&aggnonce).unwrap();
        let decoded: AggregateNonce = bincode::deserialize(&encoded).unwrap();
        assert_eq!(aggnonce, decoded);
    }

    #[test]
    fn lift_x_always_even_y() {
        for k in 1u64..8 {
            let point = (ProjectivePoint::GENERATOR * Scalar::from(k)).to_affine();
            let mut x = [0u8; 32];
            x.copy_from_slice(&point.x());

            let lifted = lift_x(&x).unwrap();
            assert!(!bool::from(lifted.y_is_odd()));
            assert_eq!(lifted.x(), point.x());
        }
    }
}
