//! Provider search (C4, §4.1): given a demand exchange and its candidate
//! providers, pick the one the tech-index builder should link to.

use lca_schemas::exchange::CalcExchange;
use lca_schemas::linking::{LinkingConfig, PreferredType, ProviderCandidate, ProviderLinking};
use lca_schemas::process_product::ProcessProduct;

/// An exchange is a link candidate iff it is not elementary and is either
/// an input product or an output waste (link-candidate filter, §4.1).
/// Under `ONLY_DEFAULTS` it additionally requires a non-zero default
/// provider.
pub fn is_link_candidate(exchange: &CalcExchange, policy: ProviderLinking) -> bool {
    if !exchange.is_link_candidate() {
        return false;
    }
    if policy == ProviderLinking::OnlyDefaults && exchange.default_provider_id == 0 {
        return false;
    }
    true
}

/// Runs the §4.1 ordered decisions against `candidates` (the providers of
/// `exchange.flow_id`) under `config`.
pub fn find(
    exchange: &CalcExchange,
    candidates: &[ProviderCandidate],
    config: &LinkingConfig,
) -> Option<ProcessProduct> {
    // 1. An installed callback may veto the exchange outright.
    if let Some(callback) = &config.callback {
        if callback.select(exchange, candidates).is_none() {
            return None;
        }
    }

    // 2. No providers at all.
    if candidates.is_empty() {
        return None;
    }

    // 3. The persisted default wins immediately unless linking is IGNORE.
    if config.provider_linking != ProviderLinking::Ignore {
        if let Some(default) = candidates
            .iter()
            .find(|c| c.process_id == exchange.default_provider_id)
        {
            return Some(default.product());
        }
    }

    // 4. ONLY_DEFAULTS with no default match leaves the exchange unlinked.
    if config.provider_linking == ProviderLinking::OnlyDefaults {
        return None;
    }

    // 5. A single candidate needs no further decision.
    if candidates.len() == 1 {
        return Some(candidates[0].product());
    }

    // 6. A callback may narrow the remaining candidates.
    let narrowed: Vec<ProviderCandidate> = if let Some(callback) = &config.callback {
        match callback.select(exchange, candidates) {
            None => return None,
            Some(subset) => subset,
        }
    } else {
        candidates.to_vec()
    };

    if narrowed.is_empty() {
        return None;
    }
    if narrowed.len() == 1 {
        return Some(narrowed[0].product());
    }

    // 7. Tie-break by preferred process type, else the first by index.
    narrowed
        .iter()
        .find(|c| config.preferred_type.matches(c.process_type))
        .or_else(|| narrowed.first())
        .map(|c| c.product())
}
