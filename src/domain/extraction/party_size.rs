//! Party size: digits or number words between 1 and 20

use super::correction::{has_correction_cue, resolve, Candidate};
use super::normalize;
use crate::domain::lexicon::LanguagePack;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_PARTY: u32 = 1;
pub const MAX_PARTY: u32 = 20;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,3}\b").unwrap());

pub fn extract_party_size(utterance: &str, pack: &LanguagePack) -> Option<u8> {
    let text = normalize(utterance);
    let mut candidates = Vec::new();

    for m in DIGITS.find_iter(&text) {
        if is_compound_number(&text, m.start(), m.end()) {
            continue;
        }
        if let Ok(n) = m.as_str().parse::<u32>() {
            if in_range(n) {
                candidates.push(Candidate::new(n, m.start(), m.end()));
            }
        }
    }

    for (m, n) in pack.numbers.find_all(&text) {
        if in_range(n) {
            candidates.push(Candidate::new(n, m.start, m.end));
        }
    }

    let corrected = has_correction_cue(&text, pack);
    resolve(candidates, corrected).and_then(|n| u8::try_from(n).ok())
}

fn in_range(n: u32) -> bool {
    (MIN_PARTY..=MAX_PARTY).contains(&n)
}

/// Digits that are one half of a time or date ("21:30", "10/03")
fn is_compound_number(text: &str, start: usize, end: usize) -> bool {
    let joined = |c: char| matches!(c, ':' | '/' | '.' | '-');
    let before = text[..start].chars().rev().take(2).collect::<Vec<_>>();
    let after = text[end..].chars().take(2).collect::<Vec<_>>();
    let digit_behind = matches!(before.as_slice(), [sep, d, ..] if joined(*sep) && d.is_ascii_digit());
    let digit_ahead = matches!(after.as_slice(), [sep, d, ..] if joined(*sep) && d.is_ascii_digit());
    digit_behind || digit_ahead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use crate::domain::lexicon::Lexicon;

    fn lexicon() -> Lexicon {
        Lexicon::embedded().unwrap()
    }

    #[test]
    fn test_numerals_in_every_language() {
        let lexicon = lexicon();
        for language in Language::ALL {
            let pack = lexicon.pack(language);
            for n in 1..=20u8 {
                let utterance = format!("... {} ...", n);
                assert_eq!(
                    extract_party_size(&utterance, pack),
                    Some(n),
                    "{} in {}",
                    n,
                    language
                );
            }
        }
    }

    #[test]
    fn test_number_words_in_every_language() {
        let lexicon = lexicon();
        for language in Language::ALL {
            let pack = lexicon.pack(language);
            for word in pack.numbers.keywords().phrases() {
                let expected = pack.numbers.get(word).unwrap();
                if !(1..=20).contains(&expected) {
                    continue;
                }
                let utterance = format!("... {} ...", word);
                assert_eq!(
                    extract_party_size(&utterance, pack),
                    Some(expected as u8),
                    "{:?} in {}",
                    word,
                    language
                );
            }
        }
    }

    #[test]
    fn test_out_of_range() {
        let lexicon = lexicon();
        let pack = lexicon.pack(Language::Es);
        assert_eq!(extract_party_size("somos 25", pack), None);
        assert_eq!(extract_party_size("somos 0", pack), None);
        assert_eq!(extract_party_size("no lo sé todavía", pack), None);
    }

    #[test]
    fn test_correction_takes_latest() {
        let lexicon = lexicon();
        assert_eq!(
            extract_party_size("somos cuatro, no, mejor cinco", lexicon.pack(Language::Es)),
            Some(5)
        );
        assert_eq!(
            extract_party_size("four people, sorry, make it 6", lexicon.pack(Language::En)),
            Some(6)
        );
    }

    #[test]
    fn test_ignores_times() {
        let lexicon = lexicon();
        let pack = lexicon.pack(Language::Es);
        assert_eq!(extract_party_size("para 4 a las 21:30", pack), Some(4));
    }
}
