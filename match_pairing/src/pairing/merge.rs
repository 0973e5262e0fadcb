//! Merging caller-supplied pairs into algorithm output.

use std::collections::HashMap;

use super::algorithms::AlgorithmOutput;
use super::models::{Pair, PairingMetadata};

/// Merge manual pairs over automatic ones, keyed by `match_number`.
///
/// A manual pair whose number matches an automatic pair replaces it in place;
/// the rest are appended in the order given. The metadata gains `hybrid` and
/// the number of manual pairs applied.
pub fn merge_overrides(auto: AlgorithmOutput, manual: &[Pair]) -> AlgorithmOutput {
    let AlgorithmOutput {
        mut pairs,
        metadata,
    } = auto;

    let slots: HashMap<u32, usize> = pairs
        .iter()
        .enumerate()
        .map(|(index, pair)| (pair.match_number, index))
        .collect();

    for pair in manual {
        match slots.get(&pair.match_number) {
            Some(&index) => pairs[index] = pair.clone(),
            None => pairs.push(pair.clone()),
        }
    }

    AlgorithmOutput {
        pairs,
        metadata: PairingMetadata {
            hybrid: Some(true),
            overrides_applied: Some(manual.len()),
            ..metadata
        },
    }
}

/// Output for a MANUAL request: the caller's pairs, unchanged
pub fn manual_output(pairs: &[Pair]) -> AlgorithmOutput {
    AlgorithmOutput {
        pairs: pairs.to_vec(),
        metadata: PairingMetadata {
            algorithm: Some("manual".to_string()),
            manual: Some(true),
            ..Default::default()
        },
    }
}
