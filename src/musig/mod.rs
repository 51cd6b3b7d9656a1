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

//! A Rust implementation of MuSig2 multi-signatures and key aggregation.

//! Implementation for secp256k1 Schnorr signatures of
//! "MuSig2: Simple Two-Round Schnorr Multi-Signatures" by
//! Jonas Nick, Tim Ruffing, and Yannick Seurin
//! https://eprint.iacr.org/2020/1261
//!
//! The original MuSig scheme of
//! "Simple Schnorr Multi-Signatures with Applications to Bitcoin"
//! https://eprint.iacr.org/2018/068
//! needs three communication rounds; the two-nonce construction here
//! gets the round count down to two without reopening the
//! rogue-nonce problems described in
//! "On the Provable Security of Two-Round Multi-Signatures"
//! https://eprint.iacr.org/2018/417
//!
//! Protocol flow: every signer derives a nonce pair from a fresh
//! session id and publishes the public half. The public nonces are
//! aggregated and processed into a `Session` against the message and
//! the aggregated key, then each signer's partial signature is
//! produced, exchanged, optionally verified share by share, and
//! summed. Nonce exchange and share exchange are the caller's
//! transport problem; everything here is pure computation.

mod nonce;
pub use nonce::{AggregateNonce, PublicNonce, SecretNonce, PUBLIC_NONCE_LENGTH};

mod session;
pub use session::Session;

mod partial;
pub use partial::{PartialSignature, PARTIAL_SIGNATURE_LENGTH};
