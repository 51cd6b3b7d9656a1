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

#[macro_use]
extern crate criterion;

mod musig_benches {
    use criterion::Criterion;
    use musig2::*;
    use rand::Rng;

    const N_SIGNERS: usize = 3;

    fn setup() -> (Vec<Keypair>, [u8; 32]) {
        let mut csprng = rand::thread_rng();
        let signers = (0..N_SIGNERS)
            .map(|_| Keypair::generate(&mut csprng))
            .collect();
        (signers, csprng.gen())
    }

    fn key_aggregation(c: &mut Criterion) {
        let (signers, _) = setup();
        let pubkeys: Vec<PublicKey> = signers.iter().map(|kp| kp.public).collect();

        c.bench_function("MuSig2 key aggregation", move |b| {
            b.iter(|| MultiKey::new(&pubkeys).unwrap())
        });
    }

    fn signing_round(c: &mut Criterion) {
        let (signers, msg) = setup();
        let pubkeys: Vec<PublicKey> = signers.iter().map(|kp| kp.public).collect();
        let multikey = MultiKey::new(&pubkeys).unwrap();

        c.bench_function("MuSig2 full signing round", move |b| {
            b.iter(|| {
                let mut csprng = rand::thread_rng();
                let mut secnonces = Vec::new();
                let mut pubnonces = Vec::new();
                for keypair in &signers {
                    let session_id: [u8; 32] = csprng.gen();
                    let (secnonce, pubnonce) = SecretNonce::generate(
                        &session_id,
                        Some(&keypair.secret),
                        &keypair.public,
                        Some(&msg),
                        None,
                    )
                    .unwrap();
                    secnonces.push(secnonce);
                    pubnonces.push(pubnonce);
                }

                let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
                let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();

                let partial_sigs: Vec<PartialSignature> = secnonces
                    .iter_mut()
                    .zip(&signers)
                    .map(|(secnonce, keypair)| {
                        session.partial_sign(secnonce, keypair, &multikey).unwrap()
                    })
                    .collect();

                session.partial_sig_agg(&partial_sigs).unwrap()
            })
        });
    }

    fn aggregate_verification(c: &mut Criterion) {
        let (signers, msg) = setup();
        let mut csprng = rand::thread_rng();
        let pubkeys: Vec<PublicKey> = signers.iter().map(|kp| kp.public).collect();
        let multikey = MultiKey::new(&pubkeys).unwrap();
        let aggregated_key = multikey.aggregated_key().unwrap();

        let mut secnonces = Vec::new();
        let mut pubnonces = Vec::new();
        for keypair in &signers {
            let session_id: [u8; 32] = csprng.gen();
            let (secnonce, pubnonce) = SecretNonce::generate(
                &session_id,
                Some(&keypair.secret),
                &keypair.public,
                Some(&msg),
                None,
            )
            .unwrap();
            secnonces.push(secnonce);
            pubnonces.push(pubnonce);
        }
        let aggnonce = AggregateNonce::combine(&pubnonces).unwrap();
        let session = Session::new(&multikey, &aggnonce, &msg, None).unwrap();
        let partial_sigs: Vec<PartialSignature> = secnonces
            .iter_mut()
            .zip(&signers)
            .map(|(secnonce, keypair)| session.partial_sign(secnonce, keypair, &multikey).unwrap())
            .collect();
        let signature = session.partial_sig_agg(&partial_sigs).unwrap();

        c.bench_function("MuSig2 aggregate signature verification", move |b| {
            b.iter(|| signature.verify(&msg, &aggregated_key))
        });
    }

    criterion_group! {
        name = musig_benches;
        config = Criterion::default();
        targets =
            key_aggregation,
            signing_round,
            aggregate_verification,
    }
}

criterion_main!(musig_benches::musig_benches);
