// ABOUTME: Lightweight stopword-based language detection for analysis responses
// ABOUTME: Distinguishes en/fr/es/de; anything ambiguous falls back to English
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

const ENGLISH: &[&str] = &[
    "the", "and", "you", "that", "this", "with", "your", "they", "their", "what", "when", "have",
    "from", "would", "about",
];
const FRENCH: &[&str] = &[
    "le", "la", "les", "de", "des", "et", "vous", "que", "qui", "avec", "votre", "leur", "dans",
    "pour", "est", "une", "pas", "cette",
];
const SPANISH: &[&str] = &[
    "el", "la", "los", "las", "de", "que", "con", "su", "una", "para", "por", "como", "est\u{e1}",
    "pero", "cuando", "usted",
];
const GERMAN: &[&str] = &[
    "der", "die", "das", "und", "sie", "mit", "ihre", "ihr", "nicht", "ist", "ein", "eine", "wenn",
    "dass", "auch", "sich",
];

/// Detect the dominant language of a text
///
/// Scores each candidate by stopword hits; English wins ties so short or
/// language-neutral text never flips the UI unexpectedly.
#[must_use]
pub fn detect_language(text: &str) -> &'static str {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    if words.is_empty() {
        return "en";
    }

    let score = |stopwords: &[&str]| words.iter().filter(|w| stopwords.contains(&w.as_str())).count();

    let en = score(ENGLISH);
    let fr = score(FRENCH);
    let es = score(SPANISH);
    let de = score(GERMAN);

    let best = en.max(fr).max(es).max(de);
    if best == 0 || en == best {
        "en"
    } else if fr == best {
        "fr"
    } else if es == best {
        "es"
    } else {
        "de"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english() {
        let text = "They feel that you dismissed their concerns and this is about trust.";
        assert_eq!(detect_language(text), "en");
    }

    #[test]
    fn detects_french() {
        let text = "Ils pensent que vous ne comprenez pas leur point de vue dans cette situation.";
        assert_eq!(detect_language(text), "fr");
    }

    #[test]
    fn detects_spanish() {
        let text = "Ellos sienten que usted no los escucha y que la conversaci\u{f3}n es para nada.";
        assert_eq!(detect_language(text), "es");
    }

    #[test]
    fn detects_german() {
        let text = "Sie haben das Gef\u{fc}hl, dass Sie ihre Sorgen nicht ernst nehmen und sich nicht k\u{fc}mmern.";
        assert_eq!(detect_language(text), "de");
    }

    #[test]
    fn empty_text_defaults_to_english() {
        assert_eq!(detect_language(""), "en");
        assert_eq!(detect_language("12345 !!!"), "en");
    }
}
