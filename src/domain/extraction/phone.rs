//! Phone number, typed as digits or spoken digit by digit

use super::normalize;
use crate::domain::lexicon::LanguagePack;
use crate::domain::shared::value_objects::MIN_PHONE_DIGITS;
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d(?:[\s.\-]?\d){8,}").unwrap());

/// Digits of the number the caller gave, with a leading `+` kept
pub fn extract_phone(utterance: &str, pack: &LanguagePack) -> Option<String> {
    let text = normalize(utterance);

    if let Some(found) = DIRECT.find_iter(&text).last() {
        let number: String = found
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        return Some(number);
    }

    let mut digits = String::new();
    for token in text.split(|c: char| c.is_whitespace() || matches!(c, '.' | '-')) {
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            digits.push_str(token);
        } else if let Some(d) = pack.phone_digits.get(token) {
            if let Some(c) = char::from_digit(d, 10) {
                digits.push(c);
            }
        }
    }

    (digits.len() >= MIN_PHONE_DIGITS).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use crate::domain::lexicon::Lexicon;

    #[test]
    fn test_grouped_digits() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(extract_phone("123 456 789", es), Some("123456789".into()));
        assert_eq!(extract_phone("es el 612-345-678", es), Some("612345678".into()));
        assert_eq!(
            extract_phone("+34 612 34 56 78", es),
            Some("+34612345678".into())
        );
    }

    #[test]
    fn test_spoken_digits() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(
            extract_phone("seis uno dos tres cuatro cinco seis siete ocho", es),
            Some("612345678".into())
        );
        let en = lexicon.pack(Language::En);
        assert_eq!(
            extract_phone("six one two, 34 five six seven eight", en),
            Some("612345678".into())
        );
    }

    #[test]
    fn test_too_short() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(extract_phone("612 345", es), None);
        assert_eq!(extract_phone("sí, este mismo", es), None);
    }
}
