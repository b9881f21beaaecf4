// Pattern library - regular-expression primitives for age detection.
//
// Every matcher takes already-normalized text (see `normalize`), never fails,
// and reports "no match" as `None`/`false`. The heuristic classifier decides
// how they combine.

use regex::Regex;
use std::sync::OnceLock;

/// Oldest age we accept as a real declaration. Anything above is treated as
/// spam or a seller listing, not as an adult.
pub const MAX_PLAUSIBLE_AGE: u32 = 70;
pub const ADULT_AGE: u32 = 18;

/// Lower-case and trim the text, folding typographic apostrophes so `i’m`
/// and `i'm` hit the same pattern.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

// ============================================================================
// COMPILED PATTERNS
// ============================================================================

/// Number followed by a years marker: `16yo`, `16 y.o.`, `16 y/o`,
/// `16 years old`, `16-year-old`.
fn years_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?P<age>\d{1,3})[\s-]*(?:y\.?o\b|y/o\b|(?:yrs?|years?)[\s-]*old\b)")
            .expect("years marker regex")
    })
}

/// Two-digit number followed by gender shorthand: `17m`, `25 f`, `16/f`, `19 male`.
///
/// Single digits are left out: `5m` is a distance or a duration far more
/// often than an age.
fn gender_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?P<age>\d{2,3})\s*/?\s*(?:m|f|male|female)\b")
            .expect("gender marker regex")
    })
}

/// Self-introduction: `i'm 16`, `im 16`, `i am 16`.
fn self_intro_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:i'm|im|i am)\s+(?P<age>\d{1,3})\b").expect("self intro regex")
    })
}

/// Explicit label: `age 16`, `age: 16`, `aged 16`.
fn age_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bage[d]?\s*[:=]?\s*(?P<age>\d{1,3})\b").expect("age label regex")
    })
}

/// Digit-reversed codes for 14-19, optionally with gender shorthand.
fn swapped_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?P<code>[4-9]1)(?:\s*(?:m|f))?\b").expect("swapped code regex")
    })
}

fn reversal_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:revers(?:e|ed)|swap(?:ped)?|invert(?:ed)?|flip(?:ped)?)\b|[🔄🔃🔁🔀↔⇄⇆↩↪]",
        )
        .expect("reversal marker regex")
    })
}

fn minor_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:under\s*-?\s*age(?:d)?|under\s*-?\s*18|u\s*-?\s*18|minors?|high\s*school(?:er)?|middle\s*school|hs)\b",
        )
        .expect("minor phrase regex")
    })
}

/// Negation at most two words before a minor phrase: `no minors`,
/// `not a minor`, `dni u18`, `not in hs`.
fn negation_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:no|not|dni|non)\b(?:[\s-]+\w+){0,2}[\s-]*$").expect("negation regex")
    })
}

fn measurement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\d\s*(?:cm|inch(?:es)?)\b|\din\b|\d""#).expect("measurement regex")
    })
}

/// What may follow a number and make it "not an age": units, decimals, feet.
fn unit_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?:\s*(?:cm|inch(?:es)?|ft|feet|foot|min(?:ute)?s?|h(?:ou)?rs?|hours?|km|miles?|kg|lbs?)\b|in\b|"|'|\.\d|%)"#,
        )
        .expect("unit suffix regex")
    })
}

/// What may precede a number and make it "not an age": `mine is 7`, `size 15`, `$20`.
fn non_age_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\bmine is|\bsize|\blength|\$|€|£)\s*$").expect("non-age prefix regex")
    })
}

// ============================================================================
// HELPERS
// ============================================================================

/// True when the number spanning `start..end` is a measurement, a price or a
/// size rather than an age.
fn is_non_age_number(text: &str, start: usize, end: usize) -> bool {
    unit_suffix_re().is_match(&text[end..]) || non_age_prefix_re().is_match(&text[..start])
}

/// Every marker-qualified number in the text, in order of appearance.
fn declared_ages(text: &str) -> Vec<u32> {
    let mut found: Vec<(usize, u32)> = Vec::new();

    for re in [
        years_marker_re(),
        gender_marker_re(),
        self_intro_re(),
        age_label_re(),
    ] {
        for caps in re.captures_iter(text) {
            let Some(m) = caps.name("age") else { continue };
            if is_non_age_number(text, m.start(), m.end()) {
                continue;
            }
            if let Ok(age) = m.as_str().parse::<u32>() {
                found.push((m.start(), age));
            }
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.dedup();
    found.into_iter().map(|(_, age)| age).collect()
}

fn reverse_code(code: &str) -> Option<u32> {
    code.chars().rev().collect::<String>().parse().ok()
}

// ============================================================================
// MATCHERS
// ============================================================================

/// Age 1-17 declared with an age marker.
pub fn matches_direct_minor_age(text: &str) -> Option<u32> {
    declared_ages(text)
        .into_iter()
        .find(|age| (1..ADULT_AGE).contains(age))
}

/// Digit-reversed age (41 → 14 ... 91 → 19), only when a reversal marker is
/// present somewhere in the message. The result may be 18 or 19: the caller
/// treats those as adult.
pub fn matches_swapped_code(text: &str) -> Option<u32> {
    if !reversal_marker_re().is_match(text) {
        return None;
    }

    swapped_code_re()
        .captures_iter(text)
        .filter_map(|caps| caps.name("code"))
        .filter(|m| !is_non_age_number(text, m.start(), m.end()))
        .find_map(|m| reverse_code(m.as_str()))
}

/// Explicit self-identification as under 18.
pub fn matches_minor_phrase(text: &str) -> bool {
    minor_phrase_re()
        .find_iter(text)
        .any(|m| !negation_suffix_re().is_match(&text[..m.start()]))
}

/// Age 18-70 declared with an age marker. Values above 70 are ignored, not
/// taken as adult.
pub fn matches_adult_age_token(text: &str) -> Option<u32> {
    declared_ages(text)
        .into_iter()
        .find(|age| (ADULT_AGE..=MAX_PLAUSIBLE_AGE).contains(age))
}

/// A number glued to a length unit: `8cm`, `7in`, `7.5"`, `6 inches`.
pub fn has_measurement_context(text: &str) -> bool {
    measurement_re().is_match(text)
}
