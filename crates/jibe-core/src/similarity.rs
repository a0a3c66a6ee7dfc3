use std::collections::HashMap;

use tracing::debug;

/// Scores strictly above this are treated as duplicates.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Dice coefficient over the multiset of character bigrams.
///
/// Inputs shorter than two characters have no bigrams, so they only match
/// when equal. Case is significant here; the gate lowercases before calling.
pub fn score(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len() < 2 || b_chars.len() < 2 {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for pair in a_chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_default() += 1;
    }

    let mut shared = 0usize;
    for pair in b_chars.windows(2) {
        if let Some(count) = counts.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    let total = (a_chars.len() - 1) + (b_chars.len() - 1);
    (2 * shared) as f64 / total as f64
}

/// Outcome of running a candidate through the [`Gate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accept,
    /// `matched` is the corpus entry in its stored casing.
    Reject { matched: String, score: f64 },
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Accept/reject gate for new text against an existing collection.
///
/// A linear scan: every check compares the candidate against the whole
/// corpus, so cost grows with corpus size times average length.
#[derive(Debug, Clone, Copy)]
pub struct Gate {
    threshold: f64,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl Gate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accept<S: AsRef<str>>(&self, candidate: &str, corpus: &[S]) -> Decision {
        let candidate = candidate.to_lowercase();

        let mut best: Option<(usize, f64)> = None;
        for (idx, entry) in corpus.iter().enumerate() {
            let s = score(&candidate, &entry.as_ref().to_lowercase());
            if best.is_none_or(|(_, top)| s > top) {
                best = Some((idx, s));
            }
        }

        match best {
            Some((idx, top)) if top > self.threshold => {
                let matched = corpus[idx].as_ref().to_string();
                debug!("Gate rejected candidate: score {:.3} against {:?}", top, matched);
                Decision::Reject { matched, score: top }
            }
            _ => Decision::Accept,
        }
    }
}
