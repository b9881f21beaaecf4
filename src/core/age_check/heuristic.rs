// Heuristic classifier - offline verdict built from the pattern library.
//
// Order matters: reversal codes and explicit minor phrases beat any
// adult-looking number elsewhere in the same message.

use super::age_check_models::DetectionVerdict;
use super::patterns::{
    has_measurement_context, matches_adult_age_token, matches_direct_minor_age,
    matches_minor_phrase, matches_swapped_code, normalize, ADULT_AGE,
};

pub const REASON_SWAPPED_MINOR: &str = "swapped-code-minor";
pub const REASON_SWAPPED_ADULT: &str = "swapped-code-adult";
pub const REASON_MINOR_PHRASE: &str = "minor-phrase";
pub const REASON_DIRECT_MINOR: &str = "direct-minor-age";
pub const REASON_ADULT_AGE: &str = "adult-age";
pub const REASON_NO_MATCH: &str = "no-age-pattern";
pub const REASON_MEASUREMENT_ONLY: &str = "measurement-only";

/// Classify a message without any I/O. Same input, same verdict.
pub fn classify_heuristically(text: &str) -> DetectionVerdict {
    let text = normalize(text);
    if text.is_empty() {
        return DetectionVerdict::no_age_stated();
    }

    if let Some(age) = matches_swapped_code(&text) {
        return if age >= ADULT_AGE {
            DetectionVerdict::adult(to_age(age), REASON_SWAPPED_ADULT)
        } else {
            DetectionVerdict::minor(to_age(age), REASON_SWAPPED_MINOR)
        };
    }

    if matches_minor_phrase(&text) {
        return DetectionVerdict::minor(None, REASON_MINOR_PHRASE);
    }

    if let Some(age) = matches_direct_minor_age(&text) {
        return DetectionVerdict::minor(to_age(age), REASON_DIRECT_MINOR);
    }

    if let Some(age) = matches_adult_age_token(&text) {
        return DetectionVerdict::adult(to_age(age), REASON_ADULT_AGE);
    }

    if has_measurement_context(&text) {
        DetectionVerdict::uncertain(REASON_MEASUREMENT_ONLY)
    } else {
        DetectionVerdict::uncertain(REASON_NO_MATCH)
    }
}

fn to_age(age: u32) -> Option<u8> {
    u8::try_from(age).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::age_check::age_check_models::Classification;

    #[test]
    fn test_bare_numbers_stay_uncertain() {
        for text in ["send 5 pics", "room 12", "top 10 list", "3 of us", "17"] {
            let verdict = classify_heuristically(text);
            assert_eq!(
                verdict.classification,
                Classification::Uncertain,
                "'{}' should not be classified",
                text
            );
        }
    }

    #[test]
    fn test_swapped_minor_codes() {
        for (text, age) in [("51 reversed", 15), ("61 swap", 16), ("71 🔄", 17)] {
            let verdict = classify_heuristically(text);
            assert_eq!(verdict.classification, Classification::Minor);
            assert_eq!(verdict.apparent_age, Some(age));
            assert_eq!(verdict.reason_code, REASON_SWAPPED_MINOR);
        }
    }

    #[test]
    fn test_swapped_adult_codes() {
        for (text, age) in [("81 reversed", 18), ("91 swap", 19)] {
            let verdict = classify_heuristically(text);
            assert_eq!(verdict.classification, Classification::Adult);
            assert_eq!(verdict.apparent_age, Some(age));
        }
    }

    #[test]
    fn test_swapped_code_beats_adult_number() {
        let verdict = classify_heuristically("25m lol jk 51 reversed");
        assert_eq!(verdict.classification, Classification::Minor);
        assert_eq!(verdict.apparent_age, Some(15));
    }

    #[test]
    fn test_minor_phrase_beats_adult_number() {
        let verdict = classify_heuristically("I say 25m but really underage");
        assert_eq!(verdict.classification, Classification::Minor);
        assert_eq!(verdict.reason_code, REASON_MINOR_PHRASE);
    }

    #[test]
    fn test_measurements_are_not_minor() {
        for text in ["8cm", "7.5\"", "size 15"] {
            let verdict = classify_heuristically(text);
            assert_ne!(verdict.classification, Classification::Minor, "{}", text);
        }
        assert_eq!(
            classify_heuristically("8cm").reason_code,
            REASON_MEASUREMENT_ONLY
        );
    }

    #[test]
    fn test_direct_ages() {
        let minor = classify_heuristically("17M curious");
        assert_eq!(minor.classification, Classification::Minor);
        assert_eq!(minor.apparent_age, Some(17));

        let adult = classify_heuristically("22m bottom with 7 inch");
        assert_eq!(adult.classification, Classification::Adult);
        assert_eq!(adult.apparent_age, Some(22));
    }

    #[test]
    fn test_hyphen_dot_and_slash_markers() {
        for (text, age) in [("16-year-old here", 16), ("16 y.o.", 16), ("16/f", 16)] {
            let verdict = classify_heuristically(text);
            assert_eq!(verdict.classification, Classification::Minor, "{}", text);
            assert_eq!(verdict.apparent_age, Some(age));
        }

        let adult = classify_heuristically("18/M");
        assert_eq!(adult.classification, Classification::Adult);
        assert_eq!(adult.apparent_age, Some(18));
    }

    #[test]
    fn test_negated_phrase_a_few_words_back_is_not_minor() {
        let verdict = classify_heuristically("not in hs 22m");
        assert_eq!(verdict.classification, Classification::Adult);
        assert_eq!(verdict.apparent_age, Some(22));
    }

    #[test]
    fn test_implausible_age_is_not_adult() {
        let verdict = classify_heuristically("99m selling pics");
        assert_eq!(verdict.classification, Classification::Uncertain);
    }

    #[test]
    fn test_empty_text_has_no_age() {
        assert_eq!(
            classify_heuristically("   ").classification,
            Classification::NoAgeStated
        );
    }

    #[test]
    fn test_classification_is_idempotent() {
        for text in ["17m curious", "dms open", "81 reversed", "i'm 7 inches"] {
            assert_eq!(classify_heuristically(text), classify_heuristically(text));
        }
    }
}
