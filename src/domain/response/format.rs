//! Filling `{placeholder}` templates with spoken slot values

use crate::domain::conversation::Slots;
use crate::domain::lexicon::LanguagePack;
use chrono::{Datelike, NaiveDate, NaiveTime};

/// Replace every `{name}` in `template` with its value
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

/// "20 de marzo", "20 March", ...
pub fn speak_date(date: NaiveDate, pack: &LanguagePack) -> String {
    let month = pack
        .format
        .months
        .get(date.month0() as usize)
        .cloned()
        .unwrap_or_else(|| date.month().to_string());
    pack.format
        .date
        .replace("{day}", &date.day().to_string())
        .replace("{month}", &month)
}

pub fn speak_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Digit words in groups of three: "seis uno dos, tres cuatro cinco, ..."
pub fn speak_phone(phone: &str, pack: &LanguagePack) -> String {
    let words: Vec<&str> = phone
        .chars()
        .filter_map(|c| c.to_digit(10))
        .filter_map(|d| pack.format.digits.get(d as usize).map(String::as_str))
        .collect();
    words
        .chunks(3)
        .map(|group| group.join(" "))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Template variables for every filled slot
pub fn slot_vars(slots: &Slots, pack: &LanguagePack) -> Vec<(&'static str, String)> {
    let mut vars = Vec::new();
    if let Some(people) = slots.party_size {
        vars.push(("people", people.to_string()));
        let noun = if people == 1 {
            &pack.format.person
        } else {
            &pack.format.people
        };
        vars.push(("people_noun", noun.clone()));
    }
    if let Some(date) = slots.date {
        vars.push(("date", speak_date(date, pack)));
    }
    if let Some(time) = slots.time {
        vars.push(("time", speak_time(time)));
    }
    if let Some(name) = &slots.name {
        vars.push(("name", name.clone()));
    }
    if let Some(phone) = &slots.phone {
        vars.push(("phone", speak_phone(phone, pack)));
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::Language;
    use crate::domain::lexicon::Lexicon;

    #[test]
    fn test_render() {
        let text = render(
            "Mesa para {people} {people_noun}",
            &[("people", "4".into()), ("people_noun", "personas".into())],
        );
        assert_eq!(text, "Mesa para 4 personas");
        assert_eq!(render("sin variables", &[]), "sin variables");
    }

    #[test]
    fn test_speak_date_and_phone() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        assert_eq!(speak_date(date, es), "20 de marzo");
        assert_eq!(
            speak_phone("612345678", es),
            "seis uno dos, tres cuatro cinco, seis siete ocho"
        );
        assert_eq!(speak_phone("+3461", es), "tres cuatro seis, uno");
    }

    #[test]
    fn test_slot_vars_singular() {
        let lexicon = Lexicon::embedded().unwrap();
        let es = lexicon.pack(Language::Es);
        let slots = Slots {
            party_size: Some(1),
            ..Slots::default()
        };
        let text = render("{people} {people_noun}", &slot_vars(&slots, es));
        assert_eq!(text, "1 persona");
    }
}
