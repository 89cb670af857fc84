// Copyright (c) 2018-2025 The Botho Foundation

use pcr_core_types::TaskId;
use pcr_crypto_keys::RistrettoPrivate;
use pcr_crypto_ring_signature::{
    LinkTag, LinkableRingScheme, LsagScheme, PublicKeyRing, RingSignature, RingSignatureKind,
};
use proptest::prelude::*;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

const CONTEXT: &[u8] = b"pcr|task-001|v1";

fn setup(n: usize, seed: u64, task: &str) -> (Vec<RistrettoPrivate>, PublicKeyRing) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let keys: Vec<RistrettoPrivate> = (0..n)
        .map(|_| RistrettoPrivate::from_random(&mut rng))
        .collect();
    let ring = PublicKeyRing::build(
        TaskId::from(task),
        keys.iter().map(RistrettoPrivate::public_key).collect(),
        1_700_000_000,
    )
    .unwrap();
    (keys, ring)
}

fn sign(
    keys: &[RistrettoPrivate],
    ring: &PublicKeyRing,
    signer: usize,
    message: &[u8],
    rng: &mut ChaCha20Rng,
) -> RingSignature {
    LsagScheme
        .sign(message, ring, signer, &keys[signer], CONTEXT, rng)
        .unwrap()
}

#[test]
fn sign_verify_roundtrip() {
    let mut rng = ChaCha20Rng::seed_from_u64(100);
    let (keys, ring) = setup(5, 1, "task-001");
    let sig = sign(&keys, &ring, 2, b"report", &mut rng);

    assert_eq!(sig.backend, "lsag-ristretto-v1");
    assert_eq!(sig.ring_size, 5);
    assert_eq!(sig.ring_id, *ring.ring_id());
    assert!(LsagScheme.verify(b"report", &sig, &ring));
}

#[test]
fn swapped_message_context_or_ring_is_rejected() {
    let mut rng = ChaCha20Rng::seed_from_u64(101);
    let (keys, ring) = setup(4, 2, "task-001");
    let sig = sign(&keys, &ring, 1, b"report", &mut rng);

    assert!(!LsagScheme.verify(b"other report", &sig, &ring));

    let mut wrong_context = sig.clone();
    wrong_context.context = b"pcr|task-002|v1".to_vec();
    assert!(!LsagScheme.verify(b"report", &wrong_context, &ring));

    let (_, other_ring) = setup(4, 3, "task-001");
    assert!(!LsagScheme.verify(b"report", &sig, &other_ring));

    let mut forged_size = sig.clone();
    forged_size.ring_size = 3;
    assert!(!LsagScheme.verify(b"report", &forged_size, &ring));

    let mut foreign_backend = sig.clone();
    foreign_backend.backend = "mock".into();
    assert!(!LsagScheme.verify(b"report", &foreign_backend, &ring));
}

#[test]
fn forged_link_tag_is_rejected() {
    let mut rng = ChaCha20Rng::seed_from_u64(102);
    let (keys, ring) = setup(3, 4, "task-001");
    let mut sig = sign(&keys, &ring, 0, b"report", &mut rng);
    sig.link_tag = LinkTag::from([7u8; 32]);
    assert!(!LsagScheme.verify(b"report", &sig, &ring));
}

#[test]
fn link_tag_is_stable_per_signer_and_distinct_across_signers() {
    let mut rng = ChaCha20Rng::seed_from_u64(103);
    let (keys, ring) = setup(4, 5, "task-001");

    let a1 = sign(&keys, &ring, 0, b"first", &mut rng);
    let a2 = sign(&keys, &ring, 0, b"second", &mut rng);
    let b1 = sign(&keys, &ring, 3, b"first", &mut rng);

    assert_eq!(a1.link_tag, a2.link_tag);
    assert_ne!(a1.link_tag, b1.link_tag);
    assert_ne!(a1.signature, a2.signature);
}

#[test]
fn signer_must_hold_the_indexed_key() {
    let mut rng = ChaCha20Rng::seed_from_u64(104);
    let (keys, ring) = setup(3, 6, "task-001");
    let result = LsagScheme.sign(b"m", &ring, 1, &keys[0], CONTEXT, &mut rng);
    assert_eq!(
        result.unwrap_err(),
        pcr_crypto_ring_signature::Error::SignerNotInRing
    );
}

#[test]
fn signature_json_roundtrip() {
    let mut rng = ChaCha20Rng::seed_from_u64(105);
    let (keys, ring) = setup(3, 7, "task-001");
    let sig = sign(&keys, &ring, 2, b"report", &mut rng);

    let json = serde_json::to_string(&sig).unwrap();
    let back: RingSignature = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sig);
    assert!(LsagScheme.verify(b"report", &back, &ring));
}

#[test]
fn kind_builds_lsag() {
    let scheme = RingSignatureKind::default().build();
    assert_eq!(scheme.backend(), LsagScheme::BACKEND);
    let kind: RingSignatureKind = serde_json::from_str("\"lsag-ristretto-v1\"").unwrap();
    assert_eq!(kind, RingSignatureKind::Lsag);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_member_can_sign(n in 1usize..10, pick in any::<prop::sample::Index>(), seed in any::<u64>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let (keys, ring) = setup(n, seed ^ 0x5eed, "task-prop");
        let signer = pick.index(n);
        let sig = sign(&keys, &ring, signer, b"payload", &mut rng);
        prop_assert!(LsagScheme.verify(b"payload", &sig, &ring));
    }
}
