//! Customer name

use super::normalize;
use crate::domain::lexicon::LanguagePack;

pub const MAX_NAME_WORDS: usize = 3;

/// Name after an introduction phrase ("me llamo", "my name is"), otherwise
/// the first word that is not filler. Title-cased, at most three words.
pub fn extract_name(utterance: &str, pack: &LanguagePack) -> Option<String> {
    let text = normalize(utterance);
    let names = &pack.names;

    for intro in &names.intros {
        let Some(found) = intro.captures(&text).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let words: Vec<&str> = found
            .as_str()
            .split_whitespace()
            .take_while(|w| !names.stop_words.contains(*w))
            .take(MAX_NAME_WORDS)
            .collect();
        if !words.is_empty() {
            return Some(title_case(&words));
        }
    }

    text.split(|c: char| c.is_whitespace() || c == '.')
        .find(|token| {
            token.chars().count() > 2
                && token.chars().all(char::is_alphabetic)
                && !names.stop_words.contains(*token)
                && pack.numbers.get(token).is_none()
        })
        .map(|token| title_case(&[token]))
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use crate::domain::lexicon::Lexicon;

    #[test]
    fn test_introductions() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(extract_name("me llamo Marta", es), Some("Marta".into()));
        assert_eq!(
            extract_name("a nombre de José García, gracias", es),
            Some("José García".into())
        );
        let en = lexicon.pack(Language::En);
        assert_eq!(
            extract_name("my name is John Smith", en),
            Some("John Smith".into())
        );
    }

    #[test]
    fn test_bare_name() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(extract_name("Marta", es), Some("Marta".into()));
        assert_eq!(extract_name("pues Lucía", es), Some("Lucía".into()));
    }

    #[test]
    fn test_at_most_three_words() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(
            extract_name("me llamo ana maría lópez ruiz", es),
            Some("Ana María López".into())
        );
    }

    #[test]
    fn test_nothing_usable() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        assert_eq!(extract_name("sí, vale", es), None);
        assert_eq!(extract_name("", es), None);
    }
}
