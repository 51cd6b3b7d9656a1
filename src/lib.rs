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

//
// MuSig2 via secp256k1
//

//Useful links:
//https://eprint.iacr.org/2020/1261
//https://blockstream.com/2018/01/23/musig-key-aggregation-schnorr-signatures/
//https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki

#[macro_use]
mod ser;

mod errors;
pub use errors::MuSigError;
pub mod tools;
pub use crate::tools::tagged_hash;
pub mod keys;
pub mod signature;
pub mod musig;
pub mod adaptor;

// Export everything public in musig2.
pub use crate::signature::{Signature, SIGNATURE_LENGTH};

pub use crate::keys::*;
pub use crate::musig::{
    AggregateNonce, PartialSignature, PublicNonce, SecretNonce, Session,
    PARTIAL_SIGNATURE_LENGTH, PUBLIC_NONCE_LENGTH,
};
pub use crate::adaptor::{adapt, extract_adaptor};
