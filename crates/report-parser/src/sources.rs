use std::collections::HashMap;

use analysis_core::GroundingSource;

/// One entry per URL: the slot sits where the URL first appeared, the record
/// stored there is the last one seen with that URL.
pub fn dedupe_sources(sources: &[GroundingSource]) -> Vec<GroundingSource> {
    // Pass 1: first-seen slot per URL.
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let mut firsts: Vec<usize> = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        slot_of.entry(source.url.as_str()).or_insert_with(|| {
            firsts.push(i);
            firsts.len() - 1
        });
    }

    // Pass 2: later occurrences overwrite the slot's value.
    let mut unique: Vec<GroundingSource> = firsts.iter().map(|&i| sources[i].clone()).collect();
    for source in sources {
        if let Some(&slot) = slot_of.get(source.url.as_str()) {
            unique[slot] = source.clone();
        }
    }

    unique
}
