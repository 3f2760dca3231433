//! End-to-end certification flows through signed transactions and direct
//! program calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use apec_core::{Address, CourseId, Digest32, ProviderId, RecordKey};
use apec_crypto::{merkle, Ed25519KeyPair};
use apec_ledger::{
    CertProgram, Instruction, IssuanceError, IssuanceRequest, MemoryStore, MemoryTokenIssuer,
    Outcome, ProgramConfig, ProgramError, RecordStore, TokenIssuer, Transaction,
};
use apec_state::{ClaimState, CredentialTier, TokenHandle};

fn key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[seed; 32])
}

fn run(program: &CertProgram, signer: &Ed25519KeyPair, ix: Instruction) -> Outcome {
    let tx = Transaction::sign(ix, signer).unwrap();
    program.execute(&tx).unwrap()
}

fn try_run(
    program: &CertProgram,
    signer: &Ed25519KeyPair,
    ix: Instruction,
) -> Result<Outcome, ProgramError> {
    let tx = Transaction::sign(ix, signer).unwrap();
    program.execute(&tx)
}

struct Course {
    provider: RecordKey,
    course: RecordKey,
}

fn register(program: &CertProgram, authority: &Ed25519KeyPair) -> Course {
    let Outcome::ProviderCreated { key: provider } = run(
        program,
        authority,
        Instruction::InitProvider {
            id: ProviderId(1),
            short_name: "APEC".into(),
        },
    ) else {
        panic!("expected provider");
    };
    let Outcome::CourseCreated { key: course } = run(
        program,
        authority,
        Instruction::CreateCourse {
            provider,
            id: CourseId(1),
            short_name: "Solana Dev".into(),
        },
    ) else {
        panic!("expected course");
    };
    Course { provider, course }
}

#[test]
fn five_member_scenario() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { provider, course } = register(&program, &authority);

    // P plus four students.
    let signers: Vec<Ed25519KeyPair> = (1..=5).map(key).collect();
    let set: Vec<Address> = signers.iter().map(|k| k.address()).collect();
    let root = merkle::build_root(&set).unwrap();

    let Outcome::CommitmentCreated { key: commitment } = run(
        &program,
        &authority,
        Instruction::CreateCommitment {
            provider,
            course,
            root,
            member_count: 5,
        },
    ) else {
        panic!("expected commitment");
    };

    let again = try_run(
        &program,
        &authority,
        Instruction::CreateCommitment {
            provider,
            course,
            root: Digest32([0; 32]),
            member_count: 5,
        },
    );
    assert!(matches!(again, Err(ProgramError::CommitmentAlreadySet(_))));

    // S2 claims with its own proof.
    let s2 = &signers[2];
    let claim = Instruction::ClaimCertified {
        commitment,
        claimant: s2.address(),
        proof: merkle::build_proof(&set, s2.address().as_bytes()).unwrap(),
        display_name: "APEC Certified".into(),
        uri: "https://apec.example/cert.json".into(),
    };
    let Outcome::Claimed { receipt } = run(&program, s2, claim.clone()) else {
        panic!("expected claim");
    };
    assert_eq!(receipt.claimant, s2.address());

    let token = program.issuer().get(receipt.token).unwrap();
    assert_eq!(token.owner, s2.address());
    assert_eq!(token.tier, CredentialTier::Certified);
    assert_eq!(token.supply, 1);

    // Repeat fails.
    assert!(matches!(
        try_run(&program, s2, claim),
        Err(ProgramError::AlreadyClaimed(_))
    ));

    // An outsider fails with every proof it can lay hands on.
    let outsider = key(0x99);
    for member in &set {
        let borrowed = merkle::build_proof(&set, member.as_bytes()).unwrap();
        let result = try_run(
            &program,
            &outsider,
            Instruction::ClaimCertified {
                commitment,
                claimant: outsider.address(),
                proof: borrowed,
                display_name: "APEC Certified".into(),
                uri: "u".into(),
            },
        );
        assert!(matches!(result, Err(ProgramError::InvalidProof { .. })));
    }

    assert_eq!(program.issuer().count(Some(CredentialTier::Certified)), 1);
    for (i, member) in set.iter().enumerate() {
        let expected = if i == 2 {
            ClaimState::Claimed
        } else {
            ClaimState::Unclaimed
        };
        assert_eq!(program.claim_state(&commitment, member), expected);
    }
}

#[test]
fn every_member_claims_exactly_once() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { provider, course } = register(&program, &authority);
    let set: Vec<Address> = (1..=9u8).map(|i| Address([i; 32])).collect();
    let root = merkle::build_root(&set).unwrap();
    let commitment = program
        .create_commitment(&authority.address(), &provider, &course, root, 9)
        .unwrap();

    for who in &set {
        let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
        program
            .claim_certified(who, &commitment, who, &proof, "Cert", "u")
            .unwrap();
    }
    for who in &set {
        let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
        assert!(program
            .claim_certified(who, &commitment, who, &proof, "Cert", "u")
            .is_err());
    }
    assert_eq!(program.issuer().count(Some(CredentialTier::Certified)), 9);
}

#[test]
fn enrollment_is_open_and_unlimited() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { course, .. } = register(&program, &authority);

    let student = key(0x10);
    for _ in 0..3 {
        run(
            &program,
            &student,
            Instruction::Enroll {
                course,
                display_name: "Enrolled".into(),
                symbol: "ENR".into(),
                uri: "u".into(),
            },
        );
    }
    let tokens = program.issuer().tokens_of(&student.address());
    assert_eq!(tokens.len(), 3);
    assert!(tokens.iter().all(|t| t.mint_authority == course));
}

#[test]
fn non_authority_cannot_create_course() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { provider, .. } = register(&program, &authority);
    let before = program.store().snapshot();

    let result = try_run(
        &program,
        &key(0x66),
        Instruction::CreateCourse {
            provider,
            id: CourseId(2),
            short_name: "Rogue".into(),
        },
    );
    assert!(matches!(result, Err(ProgramError::Unauthorized { .. })));
    assert_eq!(program.store().snapshot(), before);
}

#[test]
fn concurrent_double_claim_issues_once() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { provider, course } = register(&program, &authority);
    let set: Vec<Address> = (1..=4u8).map(|i| Address([i; 32])).collect();
    let root = merkle::build_root(&set).unwrap();
    let commitment = program
        .create_commitment(&authority.address(), &provider, &course, root, 4)
        .unwrap();

    let who = set[1];
    let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
    let successes = AtomicUsize::new(0);
    let already = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for _ in 0..32 {
            s.spawn(|| {
                match program.claim_certified(&who, &commitment, &who, &proof, "C", "u") {
                    Ok(_) => successes.fetch_add(1, Ordering::SeqCst),
                    Err(ProgramError::AlreadyClaimed(_)) => already.fetch_add(1, Ordering::SeqCst),
                    Err(e) => panic!("unexpected error: {e}"),
                };
            });
        }
    });

    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(already.load(Ordering::SeqCst), 31);
    assert_eq!(program.issuer().count(Some(CredentialTier::Certified)), 1);
}

#[test]
fn concurrent_distinct_claimants_all_succeed() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { provider, course } = register(&program, &authority);
    let set: Vec<Address> = (1..=64u8).map(|i| Address([i; 32])).collect();
    let root = merkle::build_root(&set).unwrap();
    let commitment = program
        .create_commitment(&authority.address(), &provider, &course, root, 64)
        .unwrap();

    std::thread::scope(|s| {
        for who in &set {
            let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
            let program = &program;
            s.spawn(move || {
                program
                    .claim_certified(who, &commitment, who, &proof, "C", "u")
                    .unwrap();
            });
        }
    });

    assert_eq!(program.issuer().count(Some(CredentialTier::Certified)), 64);
    assert!(set
        .iter()
        .all(|who| program.claim_state(&commitment, who) == ClaimState::Claimed));
}

/// Counts calls and fails the first `failures` of them.
struct FlakyIssuer {
    calls: AtomicUsize,
    failures: usize,
    inner: MemoryTokenIssuer,
}

impl TokenIssuer for FlakyIssuer {
    fn issue(&self, request: &IssuanceRequest) -> Result<TokenHandle, IssuanceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(IssuanceError::Unavailable(format!("attempt {n}")));
        }
        self.inner.issue(request)
    }
}

struct SlowIssuer {
    delay: Duration,
    inner: MemoryTokenIssuer,
}

impl TokenIssuer for SlowIssuer {
    fn issue(&self, request: &IssuanceRequest) -> Result<TokenHandle, IssuanceError> {
        std::thread::sleep(self.delay);
        self.inner.issue(request)
    }
}

#[test]
fn slow_issuance_does_not_serialize_distinct_claimants() {
    const CLAIMANTS: u8 = 16;
    let delay = Duration::from_millis(200);
    let issuer = SlowIssuer {
        delay,
        inner: MemoryTokenIssuer::new(),
    };
    let program = CertProgram::new(MemoryStore::new(), issuer, ProgramConfig::default());
    let owner = Address([0xee; 32]);
    let p = program.init_provider(&owner, ProviderId(1), "APEC").unwrap();
    let c = program.create_course(&owner, &p, CourseId(1), "C").unwrap();
    let set: Vec<Address> = (1..=CLAIMANTS).map(|i| Address([i; 32])).collect();
    let commitment = program
        .create_commitment(
            &owner,
            &p,
            &c,
            merkle::build_root(&set).unwrap(),
            u64::from(CLAIMANTS),
        )
        .unwrap();
    let proofs: Vec<Vec<Digest32>> = set
        .iter()
        .map(|who| merkle::build_proof(&set, who.as_bytes()).unwrap())
        .collect();

    let started = Instant::now();
    std::thread::scope(|s| {
        for (who, proof) in set.iter().zip(&proofs) {
            let program = &program;
            s.spawn(move || {
                program
                    .claim_certified(who, &commitment, who, proof, "C", "u")
                    .unwrap();
            });
        }
    });
    let elapsed = started.elapsed();

    // Serialized issuance would take CLAIMANTS * delay.
    assert!(
        elapsed < delay * 4,
        "{CLAIMANTS} claims took {elapsed:?} with a {delay:?} issuer"
    );
    assert_eq!(
        program.issuer().inner.count(Some(CredentialTier::Certified)),
        usize::from(CLAIMANTS)
    );
}

#[test]
fn issuance_failure_is_all_or_nothing() {
    let issuer = FlakyIssuer {
        calls: AtomicUsize::new(0),
        failures: 1,
        inner: MemoryTokenIssuer::new(),
    };
    let program = CertProgram::new(MemoryStore::new(), issuer, ProgramConfig::default());
    let owner = Address([0xee; 32]);
    let p = program.init_provider(&owner, ProviderId(1), "APEC").unwrap();
    let c = program.create_course(&owner, &p, CourseId(1), "C").unwrap();
    let set: Vec<Address> = (1..=3u8).map(|i| Address([i; 32])).collect();
    let commitment = program
        .create_commitment(&owner, &p, &c, merkle::build_root(&set).unwrap(), 3)
        .unwrap();

    let who = set[0];
    let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
    let records_before = program.store().len();

    let first = program.claim_certified(&who, &commitment, &who, &proof, "C", "u");
    assert!(matches!(first, Err(ProgramError::Issuance(_))));
    assert_eq!(program.store().len(), records_before);
    assert_eq!(program.claim_state(&commitment, &who), ClaimState::Unclaimed);

    let second = program
        .claim_certified(&who, &commitment, &who, &proof, "C", "u")
        .unwrap();
    assert_eq!(program.store().len(), records_before + 1);
    assert_eq!(program.issuer().inner.get(second.token).unwrap().owner, who);
}

#[test]
fn state_survives_snapshot_restore() {
    let program = CertProgram::in_memory();
    let authority = key(0xaa);
    let Course { provider, course } = register(&program, &authority);
    let set: Vec<Address> = (1..=3u8).map(|i| Address([i; 32])).collect();
    let commitment = program
        .create_commitment(
            &authority.address(),
            &provider,
            &course,
            merkle::build_root(&set).unwrap(),
            3,
        )
        .unwrap();
    let who = set[2];
    let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
    program
        .claim_certified(&who, &commitment, &who, &proof, "C", "u")
        .unwrap();

    let records = serde_json::to_string(&program.store().snapshot()).unwrap();
    let tokens = serde_json::to_string(&program.issuer().snapshot()).unwrap();

    let restored = CertProgram::new(
        MemoryStore::from_snapshot(serde_json::from_str(&records).unwrap()).unwrap(),
        MemoryTokenIssuer::from_tokens(serde_json::from_str(&tokens).unwrap()),
        ProgramConfig::default(),
    );
    assert_eq!(restored.claim_state(&commitment, &who), ClaimState::Claimed);
    assert!(matches!(
        restored.claim_certified(&who, &commitment, &who, &proof, "C", "u"),
        Err(ProgramError::AlreadyClaimed(_))
    ));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn members_claim_and_outsiders_do_not(
            set in prop::collection::btree_set(any::<[u8; 32]>(), 1..24),
            outsider in any::<[u8; 32]>(),
        ) {
            prop_assume!(!set.contains(&outsider));
            let set: Vec<Address> = set.into_iter().map(Address).collect();
            let outsider = Address(outsider);

            let program = CertProgram::in_memory();
            let owner = Address([0xee; 32]);
            let p = program.init_provider(&owner, ProviderId(1), "APEC").unwrap();
            let c = program.create_course(&owner, &p, CourseId(1), "C").unwrap();
            let commitment = program
                .create_commitment(&owner, &p, &c, merkle::build_root(&set).unwrap(), set.len() as u64)
                .unwrap();

            for who in &set {
                let proof = merkle::build_proof(&set, who.as_bytes()).unwrap();
                let outsider_attempt =
                    program.claim_certified(&outsider, &commitment, &outsider, &proof, "C", "u");
                let is_invalid_proof =
                    matches!(outsider_attempt, Err(ProgramError::InvalidProof { .. }));
                prop_assert!(is_invalid_proof);
                prop_assert!(program
                    .claim_certified(who, &commitment, who, &proof, "C", "u")
                    .is_ok());
            }
            prop_assert_eq!(
                program.issuer().count(Some(CredentialTier::Certified)),
                set.len()
            );
        }
    }
}
