//! Choosing between several candidates found in one utterance

use crate::domain::lexicon::LanguagePack;
use tracing::debug;

/// A value found in the utterance at byte span `start..end`
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub value: T,
    pub start: usize,
    pub end: usize,
}

impl<T> Candidate<T> {
    pub fn new(value: T, start: usize, end: usize) -> Self {
        Self { value, start, end }
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn within<U>(&self, other: &Candidate<U>) -> bool {
        other.start <= self.start && self.end <= other.end && other.len() > self.len()
    }
}

/// Whether the caller signalled they are correcting themselves
pub fn has_correction_cue(text: &str, pack: &LanguagePack) -> bool {
    pack.correction_cues.matches(text)
}

/// Pick the candidate the caller said last.
///
/// Candidates nested inside a longer one ("03-10" inside "2025-03-10") are
/// ignored. With several candidates, or an explicit correction cue, the
/// largest offset wins; a single candidate is returned as is.
pub fn resolve<T>(candidates: Vec<Candidate<T>>, corrected: bool) -> Option<T> {
    let spans: Vec<(usize, usize)> = candidates.iter().map(|c| (c.start, c.end)).collect();
    let outer: Vec<Candidate<T>> = candidates
        .into_iter()
        .filter(|c| {
            !spans
                .iter()
                .any(|&(start, end)| c.within(&Candidate::new((), start, end)))
        })
        .collect();

    if outer.len() > 1 || corrected {
        debug!(
            "Resolving {} candidate(s), correction cue: {}",
            outer.len(),
            corrected
        );
    }

    outer
        .into_iter()
        .max_by_key(|c| c.start)
        .map(|c| c.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_candidate_wins() {
        let candidates = vec![Candidate::new(4, 6, 12), Candidate::new(5, 24, 29)];
        assert_eq!(resolve(candidates, true), Some(5));
    }

    #[test]
    fn test_order_of_discovery_does_not_matter() {
        let candidates = vec![Candidate::new(5, 24, 29), Candidate::new(4, 6, 12)];
        assert_eq!(resolve(candidates, false), Some(5));
    }

    #[test]
    fn test_nested_candidates_are_dropped() {
        let candidates = vec![Candidate::new("iso", 0, 10), Candidate::new("pair", 5, 10)];
        assert_eq!(resolve(candidates, false), Some("iso"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(resolve::<u8>(Vec::new(), true), None);
    }
}
