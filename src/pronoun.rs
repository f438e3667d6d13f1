/// The ten Spanish subject pronouns used as conjugation chart keys.
pub const CANONICAL_PRONOUNS: [&str; 10] = [
    "yo", "tú", "él", "ella", "usted", "nosotros", "vosotros", "ellos", "ellas", "ustedes",
];

/// Maps the subject shown in a conjugation prompt onto the pronoun whose
/// chart column holds the answer.
///
/// Canonical pronouns pass through (lowercased). Compound subjects joined
/// with "y" are first person plural when they include "yo" and third
/// person plural otherwise. Anything else, such as a name, is treated as
/// third person singular.
pub fn canonicalize(subject: &str) -> String {
    let subject = subject.trim().to_lowercase();
    if CANONICAL_PRONOUNS.contains(&subject.as_str()) {
        return subject;
    }

    let mut words = subject.split_whitespace();
    if words.clone().any(|w| w == "y") {
        if words.any(|w| w == "yo") {
            "nosotros".to_string()
        } else {
            "ellos".to_string()
        }
    } else {
        "él".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pronouns_are_fixed_points() {
        for pronoun in CANONICAL_PRONOUNS {
            assert_eq!(canonicalize(pronoun), pronoun);
            assert_eq!(canonicalize(&canonicalize(pronoun)), pronoun);
        }
    }

    #[test]
    fn canonical_match_ignores_case() {
        assert_eq!(canonicalize("Ustedes"), "ustedes");
        assert_eq!(canonicalize("ÉL"), "él");
    }

    #[test]
    fn compound_subject_with_yo_is_nosotros() {
        assert_eq!(canonicalize("Juan y yo"), "nosotros");
        assert_eq!(canonicalize("yo y mi hermano"), "nosotros");
    }

    #[test]
    fn compound_subject_without_yo_is_ellos() {
        assert_eq!(canonicalize("Juan y María"), "ellos");
        assert_eq!(canonicalize("los perros y los gatos"), "ellos");
        // "yo" must be a whole word
        assert_eq!(canonicalize("Mayo y Juan"), "ellos");
        assert_eq!(canonicalize("Yolanda y Pedro"), "ellos");
    }

    #[test]
    fn singular_noun_phrase_defaults_to_el() {
        assert_eq!(canonicalize("María"), "él");
        assert_eq!(canonicalize("mi profesora"), "él");
        assert_eq!(canonicalize("Mayo"), "él");
    }
}
