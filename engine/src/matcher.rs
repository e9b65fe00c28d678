//! Rule satisfaction predicates.
//!
//! One matcher, two explicitly named zero-minimum policies. The broad-scan
//! path treats `min_items == 0` as "can never match" (a guard against
//! misconfigured thresholds), while the message-scoped direct-count path
//! treats it as "no minimum". Both behaviors are load-bearing for existing
//! rules; which one applies is always the caller's explicit choice, never an
//! accident of which function got called.

use tokengate_types::{AssetHolding, ChannelId, VerificationRule};

/// What `min_items == 0` means to the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZeroMinPolicy {
    /// Zero is a misconfiguration: the rule can never be satisfied.
    /// Used by the broad-scan evaluator and the reverification sweep.
    ZeroMeansNever,
    /// Zero means no minimum: any count (including zero) qualifies.
    /// Used by the message-scoped direct-count path.
    ZeroMeansUnbounded,
}

/// Whether one holding is applicable to a rule (collection + attribute).
pub fn holding_matches(rule: &VerificationRule, holding: &AssetHolding) -> bool {
    if !rule.collection.accepts(&holding.collection_slug) {
        return false;
    }
    match rule.attribute_filter() {
        Some((key, value)) => holding.attribute_equals(key, value),
        None => true,
    }
}

/// Count the holdings applicable to a rule.
pub fn count_matching(rule: &VerificationRule, holdings: &[AssetHolding]) -> usize {
    holdings.iter().filter(|h| holding_matches(rule, h)).count()
}

/// Shared threshold logic. `min_items = None` means an effective minimum
/// of 1; an explicit zero resolves per the policy. Negative minimums are
/// unrepresentable here, so the "less than one" guard reduces to zero.
pub fn satisfies_count(min_items: Option<u32>, count: u64, policy: ZeroMinPolicy) -> bool {
    match min_items {
        None => count >= 1,
        Some(0) => match policy {
            ZeroMinPolicy::ZeroMeansNever => false,
            ZeroMinPolicy::ZeroMeansUnbounded => true,
        },
        Some(min) => count >= u64::from(min),
    }
}

/// Full rule satisfaction against a holdings snapshot.
///
/// Predicates (all must hold): channel (wildcard, or equal to `channel_id`
/// when one is supplied; evaluations without a channel context pass this
/// predicate vacuously), collection and attribute via [`holding_matches`],
/// and the count threshold via [`satisfies_count`].
pub fn matches(
    rule: &VerificationRule,
    holdings: &[AssetHolding],
    channel_id: Option<&ChannelId>,
    policy: ZeroMinPolicy,
) -> bool {
    if let Some(channel) = channel_id {
        if !rule.channel.accepts(channel.as_str()) {
            return false;
        }
    }
    satisfies_count(rule.min_items, count_matching(rule, holdings) as u64, policy)
}
