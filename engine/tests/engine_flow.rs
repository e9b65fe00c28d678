//! End-to-end engine tests: challenge lifecycle, signature proof, rule
//! evaluation paths, assignment state machine, and the reverification sweep,
//! wired against in-memory stores and recording collaborator fakes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tokengate_crypto::{derive_address, keypair_from_seed, prove_ticket, KeyPair, SigningDomain};
use tokengate_engine::{
    AssetProvider, AssignOutcome, NotificationChannel, OutcomeNote, PlatformRoleApi,
    ProviderError, ReverificationSweeper, RoleAssignmentTracker, RuleOutcome,
    VerificationOrchestrator, VerifyError,
};
use tokengate_store::{
    AssignmentStore, MemoryAssignmentStore, MemoryNonceStore, MemoryRuleStore, RuleStore,
};
use tokengate_types::{
    AssetHolding, AssignmentKey, AssignmentStatus, ChallengeContext, EngineParams, FieldMatch,
    MessageId, RoleId, RuleId, ServerId, SubjectId, Timestamp, VerificationRule,
    VerificationTicket, WalletAddress,
};

// ── Collaborator fakes ───────────────────────────────────────────────────

#[derive(Default)]
struct FakeAssets {
    holdings: Mutex<HashMap<String, Vec<AssetHolding>>>,
    links: Mutex<HashMap<String, Vec<WalletAddress>>>,
    fail_for_subjects: Mutex<HashSet<String>>,
}

impl FakeAssets {
    fn set_holdings(&self, address: &WalletAddress, holdings: Vec<AssetHolding>) {
        self.holdings
            .lock()
            .unwrap()
            .insert(address.as_str().to_string(), holdings);
    }

    fn link(&self, subject: &SubjectId, address: &WalletAddress) {
        self.links
            .lock()
            .unwrap()
            .entry(subject.as_str().to_string())
            .or_default()
            .push(address.clone());
    }

    fn fail_for(&self, subject: &SubjectId) {
        self.fail_for_subjects
            .lock()
            .unwrap()
            .insert(subject.as_str().to_string());
    }

    fn holdings_of(&self, address: &WalletAddress) -> Vec<AssetHolding> {
        self.holdings
            .lock()
            .unwrap()
            .get(address.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssetProvider for FakeAssets {
    async fn count_matching(
        &self,
        address: &WalletAddress,
        collection: &FieldMatch,
        attribute: Option<(&str, &str)>,
        _min_items_hint: Option<u32>,
    ) -> Result<u64, ProviderError> {
        let count = self
            .holdings_of(address)
            .iter()
            .filter(|h| collection.accepts(&h.collection_slug))
            .filter(|h| match attribute {
                Some((key, value)) => h.attribute_equals(key, value),
                None => true,
            })
            .count();
        Ok(count as u64)
    }

    async fn snapshot(&self, address: &WalletAddress) -> Result<Vec<AssetHolding>, ProviderError> {
        Ok(self.holdings_of(address))
    }

    async fn addresses_for(
        &self,
        subject: &SubjectId,
    ) -> Result<Vec<WalletAddress>, ProviderError> {
        if self
            .fail_for_subjects
            .lock()
            .unwrap()
            .contains(subject.as_str())
        {
            return Err(ProviderError::new("marketplace unavailable"));
        }
        Ok(self
            .links
            .lock()
            .unwrap()
            .get(subject.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct FakePlatform {
    assigns: Mutex<Vec<(String, String)>>,
    revokes: Mutex<Vec<(String, String)>>,
    fail_assign_role: Mutex<Option<RoleId>>,
    departed: Mutex<HashSet<String>>,
}

impl FakePlatform {
    fn assign_calls(&self) -> Vec<(String, String)> {
        self.assigns.lock().unwrap().clone()
    }

    fn revoke_calls(&self) -> Vec<(String, String)> {
        self.revokes.lock().unwrap().clone()
    }

    fn fail_assigns_for(&self, role: RoleId) {
        *self.fail_assign_role.lock().unwrap() = Some(role);
    }

    fn mark_departed(&self, subject: &SubjectId) {
        self.departed
            .lock()
            .unwrap()
            .insert(subject.as_str().to_string());
    }
}

#[async_trait]
impl PlatformRoleApi for FakePlatform {
    async fn assign(
        &self,
        subject: &SubjectId,
        role: &RoleId,
        _server: &ServerId,
    ) -> Result<AssignOutcome, ProviderError> {
        if self.fail_assign_role.lock().unwrap().as_ref() == Some(role) {
            return Err(ProviderError::new("503 from platform"));
        }
        self.assigns
            .lock()
            .unwrap()
            .push((subject.as_str().to_string(), role.as_str().to_string()));
        Ok(AssignOutcome {
            already_held: false,
        })
    }

    async fn revoke(
        &self,
        subject: &SubjectId,
        role: &RoleId,
        _server: &ServerId,
    ) -> Result<bool, ProviderError> {
        self.revokes
            .lock()
            .unwrap()
            .push((subject.as_str().to_string(), role.as_str().to_string()));
        Ok(true)
    }

    async fn is_member(
        &self,
        subject: &SubjectId,
        _server: &ServerId,
    ) -> Result<bool, ProviderError> {
        Ok(!self.departed.lock().unwrap().contains(subject.as_str()))
    }
}

#[derive(Default)]
struct FakeNotifier {
    notes: Mutex<Vec<OutcomeNote>>,
    failing: AtomicBool,
}

impl FakeNotifier {
    fn notes(&self) -> Vec<OutcomeNote> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for FakeNotifier {
    async fn notify(
        &self,
        _subject: &SubjectId,
        _context: &ChallengeContext,
        note: &OutcomeNote,
    ) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(ProviderError::new("webhook timed out"));
        }
        self.notes.lock().unwrap().push(note.clone());
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    params: EngineParams,
    rules: Arc<MemoryRuleStore>,
    assignments: Arc<MemoryAssignmentStore>,
    assets: Arc<FakeAssets>,
    platform: Arc<FakePlatform>,
    notifier: Arc<FakeNotifier>,
    orchestrator: VerificationOrchestrator,
}

impl Harness {
    fn new() -> Self {
        let params = EngineParams::defaults();
        let rules = Arc::new(MemoryRuleStore::new());
        let assignments = Arc::new(MemoryAssignmentStore::new());
        let assets = Arc::new(FakeAssets::default());
        let platform = Arc::new(FakePlatform::default());
        let notifier = Arc::new(FakeNotifier::default());

        let orchestrator = VerificationOrchestrator::new(
            &params,
            Arc::new(MemoryNonceStore::new(params.nonce_capacity)),
            rules.clone(),
            RoleAssignmentTracker::new(assignments.clone()),
            assets.clone(),
            platform.clone(),
            notifier.clone(),
        );

        Self {
            params,
            rules,
            assignments,
            assets,
            platform,
            notifier,
            orchestrator,
        }
    }

    fn sweeper(&self) -> ReverificationSweeper {
        ReverificationSweeper::new(
            self.rules.clone(),
            RoleAssignmentTracker::new(self.assignments.clone()),
            self.assets.clone(),
            self.platform.clone(),
        )
    }

    fn domain(&self) -> SigningDomain {
        SigningDomain::new(
            self.params.domain_name.clone(),
            self.params.domain_version.clone(),
            self.params.chain_id,
        )
    }

    fn challenge(&self, subject: &SubjectId, context: ChallengeContext) -> String {
        self.orchestrator.nonces().create(subject, context).unwrap()
    }

    fn signed_ticket(
        &self,
        kp: &KeyPair,
        subject: &SubjectId,
        server: &ServerId,
        nonce: &str,
    ) -> (VerificationTicket, String) {
        let ticket = VerificationTicket {
            subject_id: subject.clone(),
            subject_tag: "holder#0001".into(),
            avatar_url: String::new(),
            server_id: server.clone(),
            server_name: "Test Server".into(),
            server_icon_url: String::new(),
            legacy_role_id: None,
            legacy_role_name: None,
            nonce: nonce.to_string(),
            expiry_unix_seconds: Timestamp::now().as_secs() + 600,
            claimed_address: derive_address(&kp.public),
        };
        let proof = prove_ticket(&self.domain(), &ticket, kp);
        (ticket, proof)
    }
}

fn rule(id: u64, server: &str, role: &str) -> VerificationRule {
    VerificationRule {
        id: RuleId::new(id),
        server_id: server.into(),
        message_id: None,
        channel: FieldMatch::Wildcard,
        collection: FieldMatch::Wildcard,
        attribute_key: FieldMatch::Wildcard,
        attribute_value: FieldMatch::Wildcard,
        min_items: Some(1),
        role_id: role.into(),
    }
}

fn gold_ape_rule(id: u64, server: &str, role: &str) -> VerificationRule {
    let mut r = rule(id, server, role);
    r.collection = FieldMatch::exact("apes");
    r.attribute_key = FieldMatch::exact("trait");
    r.attribute_value = FieldMatch::exact("gold");
    r
}

fn gold_apes(n: usize) -> Vec<AssetHolding> {
    (0..n)
        .map(|_| AssetHolding::new("apes").with_attribute("trait", "gold"))
        .collect()
}

// ── Verification pipeline ────────────────────────────────────────────────

#[tokio::test]
async fn broad_scan_grants_role_for_qualifying_holdings() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[1u8; 32]);

    h.rules.put_rule(gold_ape_rule(1, "s1", "r-gold")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(2));

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);

    let outcome = h.orchestrator.verify(&ticket, &proof).await.unwrap();
    assert_eq!(outcome.assigned_roles(), vec![RoleId::new("r-gold")]);
    assert_eq!(h.platform.assign_calls().len(), 1);

    let row = h
        .assignments
        .get(&AssignmentKey::new(subject, server, "r-gold".into()))
        .unwrap()
        .unwrap();
    assert_eq!(row.status, AssignmentStatus::Active);
    assert_eq!(row.rule_id, Some(RuleId::new(1)));
}

#[tokio::test]
async fn second_challenge_invalidates_the_first_even_before_its_ttl() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[2u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r1")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(1));

    let first = h.challenge(&subject, ChallengeContext::unbound());
    let second = h.challenge(&subject, ChallengeContext::unbound());

    let (stale_ticket, stale_proof) = h.signed_ticket(&kp, &subject, &server, &first);
    let err = h
        .orchestrator
        .verify(&stale_ticket, &stale_proof)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::NonceInvalidOrExpired));

    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &second);
    assert!(h.orchestrator.verify(&ticket, &proof).await.is_ok());
}

#[tokio::test]
async fn nonce_validates_exactly_once() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[3u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r1")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(1));

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);

    assert!(h.orchestrator.verify(&ticket, &proof).await.is_ok());

    // Byte-identical replay: the challenge is already consumed.
    let err = h.orchestrator.verify(&ticket, &proof).await.unwrap_err();
    assert!(matches!(err, VerifyError::NonceInvalidOrExpired));
}

#[tokio::test]
async fn failed_signature_still_burns_the_nonce() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let holder = keypair_from_seed(&[4u8; 32]);
    let impostor = keypair_from_seed(&[5u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r1")).unwrap();
    h.assets
        .set_holdings(&derive_address(&holder.public), gold_apes(1));

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, _) = h.signed_ticket(&holder, &subject, &server, &nonce);
    let forged = prove_ticket(&h.domain(), &ticket, &impostor);

    let err = h.orchestrator.verify(&ticket, &forged).await.unwrap_err();
    assert!(matches!(err, VerifyError::SignatureMismatch));

    // The same nonce can no longer be used, even with the honest proof.
    let honest = prove_ticket(&h.domain(), &ticket, &holder);
    let err = h.orchestrator.verify(&ticket, &honest).await.unwrap_err();
    assert!(matches!(err, VerifyError::NonceInvalidOrExpired));
}

#[tokio::test]
async fn zero_minimum_policies_diverge_by_path() {
    // Message-scoped: min_items = 0 means no minimum; zero holdings qualify.
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[6u8; 32]);

    let mut bound = gold_ape_rule(1, "s1", "r-open");
    bound.message_id = Some(MessageId::new("m1"));
    bound.min_items = Some(0);
    h.rules.put_rule(bound).unwrap();

    let nonce = h.challenge(
        &subject,
        ChallengeContext::for_message("m1".into(), "c1".into()),
    );
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);

    let outcome = h.orchestrator.verify(&ticket, &proof).await.unwrap();
    assert_eq!(outcome.assigned_roles(), vec![RoleId::new("r-open")]);

    // Broad scan: min_items = 0 can never match, whatever the holdings.
    let h = Harness::new();
    let subject = SubjectId::new("u2");
    let kp = keypair_from_seed(&[7u8; 32]);

    let mut unbound = rule(2, "s1", "r-never");
    unbound.min_items = Some(0);
    h.rules.put_rule(unbound).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(3));

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);

    let err = h.orchestrator.verify(&ticket, &proof).await.unwrap_err();
    assert!(matches!(err, VerifyError::InsufficientHoldings));
    assert!(h.platform.assign_calls().is_empty());
}

#[tokio::test]
async fn revoked_assignment_reactivates_in_place() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[8u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r1")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(1));

    // Seed a previously revoked grant for the same triple.
    let key = AssignmentKey::new(subject.clone(), server.clone(), "r1".into());
    let tracker = RoleAssignmentTracker::new(h.assignments.clone());
    tracker
        .record_verified(&key, Some(RuleId::new(1)), Timestamp::new(100), None)
        .unwrap();
    tracker.mark_revoked(&key, Timestamp::new(200)).unwrap();

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
    h.orchestrator.verify(&ticket, &proof).await.unwrap();

    assert_eq!(h.assignments.len(), 1, "no second row for the same triple");
    let row = h.assignments.get(&key).unwrap().unwrap();
    assert_eq!(row.status, AssignmentStatus::Active);
}

#[tokio::test]
async fn message_scoped_evaluation_grants_multiple_roles() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[9u8; 32]);

    let mut gold = gold_ape_rule(1, "s1", "r-gold");
    gold.message_id = Some(MessageId::new("m1"));
    let mut any = rule(2, "s1", "r-any");
    any.message_id = Some(MessageId::new("m1"));
    h.rules.put_rule(gold).unwrap();
    h.rules.put_rule(any).unwrap();

    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(1));

    let nonce = h.challenge(
        &subject,
        ChallengeContext::for_message("m1".into(), "c1".into()),
    );
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);

    let outcome = h.orchestrator.verify(&ticket, &proof).await.unwrap();
    assert_eq!(outcome.assigned_roles().len(), 2);
    assert_eq!(h.platform.assign_calls().len(), 2);
}

#[tokio::test]
async fn legacy_single_role_path_requires_any_holding() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[10u8; 32]);

    h.assets
        .set_holdings(&derive_address(&kp.public), vec![AssetHolding::new("misc")]);

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (mut ticket, _) = h.signed_ticket(&kp, &subject, &server, &nonce);
    ticket.legacy_role_id = Some("r-legacy".into());
    ticket.legacy_role_name = Some("OG".into());
    let proof = prove_ticket(&h.domain(), &ticket, &kp);

    let outcome = h.orchestrator.verify(&ticket, &proof).await.unwrap();
    assert_eq!(outcome.assigned_roles(), vec![RoleId::new("r-legacy")]);

    // The grant carries no rule id.
    let row = h
        .assignments
        .get(&AssignmentKey::new(subject, server, "r-legacy".into()))
        .unwrap()
        .unwrap();
    assert_eq!(row.rule_id, None);
}

#[tokio::test]
async fn platform_failure_for_one_rule_does_not_abort_the_others() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[11u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r-ok")).unwrap();
    h.rules.put_rule(rule(2, "s1", "r-broken")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(1));
    h.platform.fail_assigns_for("r-broken".into());

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);

    let outcome = h.orchestrator.verify(&ticket, &proof).await.unwrap();
    assert_eq!(outcome.assigned_roles(), vec![RoleId::new("r-ok")]);
    assert!(outcome
        .outcomes
        .iter()
        .any(|o| matches!(o, RuleOutcome::Failed { role_id, .. } if role_id.as_str() == "r-broken")));

    // The failed rule's assignment row is still recorded; the sweep
    // reconciles platform drift later.
    let row = h
        .assignments
        .get(&AssignmentKey::new(subject, server, "r-broken".into()))
        .unwrap()
        .unwrap();
    assert_eq!(row.status, AssignmentStatus::Active);
}

#[tokio::test]
async fn no_rules_and_unsatisfied_rules_are_distinct_failures() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[12u8; 32]);

    // No rules at all.
    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
    let err = h.orchestrator.verify(&ticket, &proof).await.unwrap_err();
    assert!(matches!(err, VerifyError::NoApplicableRules));

    // Rules exist but holdings don't qualify.
    h.rules.put_rule(gold_ape_rule(1, "s1", "r-gold")).unwrap();
    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
    let err = h.orchestrator.verify(&ticket, &proof).await.unwrap_err();
    assert!(matches!(err, VerifyError::InsufficientHoldings));

    // Neither failure touched role state.
    assert_eq!(h.assignments.len(), 0);
    assert!(h.platform.assign_calls().is_empty());
}

#[tokio::test]
async fn outcome_notifications_are_best_effort() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[13u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r1")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(1));

    // Success note lists the granted roles.
    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
    h.orchestrator.verify(&ticket, &proof).await.unwrap();

    let notes = h.notifier.notes();
    assert_eq!(notes.len(), 1);
    assert!(matches!(
        &notes[0],
        OutcomeNote::Verified { roles } if roles == &vec![RoleId::new("r1")]
    ));

    // A failing channel never affects the verification result.
    h.notifier.failing.store(true, Ordering::Relaxed);
    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
    assert!(h.orchestrator.verify(&ticket, &proof).await.is_ok());
}

#[tokio::test]
async fn rejection_notes_carry_a_user_facing_reason() {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let holder = keypair_from_seed(&[14u8; 32]);
    let impostor = keypair_from_seed(&[15u8; 32]);

    h.rules.put_rule(rule(1, "s1", "r1")).unwrap();

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, _) = h.signed_ticket(&holder, &subject, &server, &nonce);
    let forged = prove_ticket(&h.domain(), &ticket, &impostor);
    let _ = h.orchestrator.verify(&ticket, &forged).await;

    let notes = h.notifier.notes();
    assert_eq!(notes.len(), 1);
    assert!(matches!(&notes[0], OutcomeNote::Rejected { reason } if reason.contains("signature")));
}

// ── Reverification sweep ─────────────────────────────────────────────────

async fn verified_harness(seed: u8) -> (Harness, SubjectId, ServerId, KeyPair) {
    let h = Harness::new();
    let subject = SubjectId::new("u1");
    let server = ServerId::new("s1");
    let kp = keypair_from_seed(&[seed; 32]);

    h.rules.put_rule(gold_ape_rule(1, "s1", "r-gold")).unwrap();
    h.assets
        .set_holdings(&derive_address(&kp.public), gold_apes(2));
    h.assets.link(&subject, &derive_address(&kp.public));

    let nonce = h.challenge(&subject, ChallengeContext::unbound());
    let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
    h.orchestrator.verify(&ticket, &proof).await.unwrap();

    (h, subject, server, kp)
}

#[tokio::test]
async fn sweep_revokes_assignment_whose_holdings_no_longer_qualify() {
    let (h, subject, server, kp) = verified_harness(20).await;

    // The holder sold the gold apes.
    h.assets.set_holdings(&derive_address(&kp.public), vec![]);

    let report = h.sweeper().run_once().await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.revoked, 1);
    assert_eq!(h.platform.revoke_calls().len(), 1, "exactly one revoke call");

    let row = h
        .assignments
        .get(&AssignmentKey::new(subject, server, "r-gold".into()))
        .unwrap()
        .unwrap();
    assert_eq!(row.status, AssignmentStatus::Revoked);
}

#[tokio::test]
async fn sweep_refreshes_assignments_that_still_qualify() {
    let (h, subject, server, _kp) = verified_harness(21).await;
    let key = AssignmentKey::new(subject, server, "r-gold".into());
    let before = h.assignments.get(&key).unwrap().unwrap().last_checked_at;

    let report = h.sweeper().run_once().await;
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.revoked, 0);
    assert!(h.platform.revoke_calls().is_empty());

    let after = h.assignments.get(&key).unwrap().unwrap();
    assert_eq!(after.status, AssignmentStatus::Active);
    assert!(after.last_checked_at >= before);
}

#[tokio::test]
async fn sweep_skips_deleted_rules_without_revoking() {
    let (h, _subject, _server, kp) = verified_harness(22).await;
    h.rules.delete_rule(RuleId::new(1)).unwrap();
    // Holdings are gone too, but with no rule there is nothing to re-check.
    h.assets.set_holdings(&derive_address(&kp.public), vec![]);

    let report = h.sweeper().run_once().await;
    assert_eq!(report.skipped, 1);
    assert_eq!(report.revoked, 0);
    assert!(h.platform.revoke_calls().is_empty());
}

#[tokio::test]
async fn sweep_skips_subjects_who_left_the_server() {
    let (h, subject, _server, kp) = verified_harness(23).await;
    h.platform.mark_departed(&subject);
    h.assets.set_holdings(&derive_address(&kp.public), vec![]);

    let report = h.sweeper().run_once().await;
    assert_eq!(report.skipped, 1);
    assert!(h.platform.revoke_calls().is_empty());
}

#[tokio::test]
async fn sweep_continues_past_per_assignment_failures() {
    let h = Harness::new();
    let server = ServerId::new("s1");
    h.rules.put_rule(gold_ape_rule(1, "s1", "r-gold")).unwrap();

    // Two holders with active grants; the first one's provider lookups fail.
    for (seed, subject_id) in [(30u8, "u-bad"), (31u8, "u-good")] {
        let subject = SubjectId::new(subject_id);
        let kp = keypair_from_seed(&[seed; 32]);
        h.assets
            .set_holdings(&derive_address(&kp.public), gold_apes(1));
        h.assets.link(&subject, &derive_address(&kp.public));

        let nonce = h.challenge(&subject, ChallengeContext::unbound());
        let (ticket, proof) = h.signed_ticket(&kp, &subject, &server, &nonce);
        h.orchestrator.verify(&ticket, &proof).await.unwrap();
    }
    h.assets.fail_for(&SubjectId::new("u-bad"));

    let report = h.sweeper().run_once().await;
    assert_eq!(report.checked, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.refreshed, 1, "the healthy assignment was still processed");

    // The failed one is untouched and will be retried next sweep.
    let bad = h
        .assignments
        .get(&AssignmentKey::new(
            "u-bad".into(),
            "s1".into(),
            "r-gold".into(),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(bad.status, AssignmentStatus::Active);
}
