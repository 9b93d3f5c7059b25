//! Share password policy: normalization, advisory strength, generation.
//!
//! Strength is advisory only. Any non-empty password is accepted.

use std::collections::HashSet;

use psbthub_crypto::{random_in_range, SecureRandom};

use crate::error::PasswordError;

pub const MIN_GENERATED_LENGTH: usize = 8;
pub const MAX_GENERATED_LENGTH: usize = 128;
pub const DEFAULT_GENERATED_LENGTH: usize = 24;

// Ambiguous glyphs (I, O, l, 0, 1) are left out.
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%&*+=?_-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrengthSignals {
    pub length: usize,
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_digit: bool,
    pub has_symbol: bool,
    pub has_sequential_pattern: bool,
    pub has_long_repeated_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthAssessment {
    /// 0..=100
    pub score: u8,
    pub level: StrengthLevel,
    pub label: &'static str,
    pub guidance: &'static str,
    pub signals: StrengthSignals,
}

pub fn normalize(raw: &str) -> &str {
    raw.trim()
}

/// Trimmed password, or `INVALID_PASSWORD` if nothing is left.
pub fn validate(raw: &str) -> Result<String, PasswordError> {
    let password = normalize(raw);
    if password.is_empty() {
        return Err(PasswordError::InvalidPassword("password is required".into()));
    }
    Ok(password.to_string())
}

/// Runs of three consecutive ascending code points (`abc`, `123`).
fn count_sequential(chars: &[char]) -> i32 {
    chars
        .windows(3)
        .filter(|w| {
            let (a, b, c) = (w[0] as i64, w[1] as i64, w[2] as i64);
            b - a == 1 && c - b == 1
        })
        .count() as i32
}

fn longest_run(chars: &[char]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for &c in chars {
        current = if previous == Some(c) { current + 1 } else { 1 };
        longest = longest.max(current);
        previous = Some(c);
    }
    longest
}

fn level_for(score: u8) -> (StrengthLevel, &'static str, &'static str) {
    match score {
        85..=u8::MAX => (
            StrengthLevel::VeryStrong,
            "Very strong",
            "Excellent resistance against guessing and brute-force attempts.",
        ),
        70..=84 => (
            StrengthLevel::Strong,
            "Strong",
            "Strong for most handoffs. A longer passphrase still improves resilience.",
        ),
        50..=69 => (
            StrengthLevel::Fair,
            "Fair",
            "Decent baseline. Add more length or character variety for stronger protection.",
        ),
        30..=49 => (
            StrengthLevel::Weak,
            "Weak",
            "Easy to guess. Increase length and avoid predictable patterns.",
        ),
        _ => (
            StrengthLevel::VeryWeak,
            "Very weak",
            "Very easy to crack. Prefer a long passphrase with mixed characters.",
        ),
    }
}

pub fn assess_strength(raw: &str) -> StrengthAssessment {
    let password = normalize(raw);
    if password.is_empty() {
        return StrengthAssessment {
            score: 0,
            level: StrengthLevel::VeryWeak,
            label: "No password",
            guidance: "Add a password to see a live strength estimate.",
            signals: StrengthSignals::default(),
        };
    }

    let chars: Vec<char> = password.chars().collect();
    let length = chars.len();
    let has_lowercase = chars.iter().any(|c| c.is_ascii_lowercase());
    let has_uppercase = chars.iter().any(|c| c.is_ascii_uppercase());
    let has_digit = chars.iter().any(|c| c.is_ascii_digit());
    let has_symbol = chars.iter().any(|c| !c.is_ascii_alphanumeric());
    let unique = chars.iter().collect::<HashSet<_>>().len();
    let lowered: Vec<char> = password.to_lowercase().chars().collect();
    let sequential = count_sequential(&lowered);
    let run = longest_run(&chars);

    let len = length as i32;
    let mut score: i32 = (len * 3).min(45);
    score += [has_lowercase, has_uppercase, has_digit, has_symbol]
        .iter()
        .filter(|&&present| present)
        .count() as i32
        * 8;
    score += ((unique as i32 - 6).max(0) * 2).min(15);
    if length >= 16 {
        score += 8;
    }
    if length >= 24 {
        score += 6;
    }
    if length < 8 {
        score -= 10;
    }
    score -= (sequential * 6).min(18);
    if run > 2 {
        score -= ((run as i32 - 2) * 6).min(18);
    }
    if unique <= length.div_ceil(3) {
        score -= 10;
    }

    let score = score.clamp(0, 100) as u8;
    let (level, label, guidance) = level_for(score);

    StrengthAssessment {
        score,
        level,
        label,
        guidance,
        signals: StrengthSignals {
            length,
            has_lowercase,
            has_uppercase,
            has_digit,
            has_symbol,
            has_sequential_pattern: sequential > 0,
            has_long_repeated_run: run > 2,
        },
    }
}

fn pick(rng: &dyn SecureRandom, alphabet: &[u8]) -> Result<u8, PasswordError> {
    let index = random_index(rng, alphabet.len() - 1)?;
    Ok(alphabet[index])
}

fn random_index(rng: &dyn SecureRandom, max: usize) -> Result<usize, PasswordError> {
    random_in_range(rng, 0, max as u32)
        .map(|i| i as usize)
        .map_err(|e| PasswordError::PlatformCryptoUnavailable(e.to_string()))
}

/// Random password with at least one character from every class.
pub fn generate(rng: &dyn SecureRandom, length: usize) -> Result<String, PasswordError> {
    if !(MIN_GENERATED_LENGTH..=MAX_GENERATED_LENGTH).contains(&length) {
        return Err(PasswordError::InvalidPassword(format!(
            "generated password length must be between {MIN_GENERATED_LENGTH} and {MAX_GENERATED_LENGTH}"
        )));
    }

    let full: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS].concat();
    let mut out = Vec::with_capacity(length);
    for class in [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS] {
        out.push(pick(rng, class)?);
    }
    while out.len() < length {
        out.push(pick(rng, &full)?);
    }

    // Fisher-Yates
    for i in (1..out.len()).rev() {
        let j = random_index(rng, i)?;
        out.swap(i, j);
    }

    Ok(out.into_iter().map(char::from).collect())
}

pub fn generate_default(rng: &dyn SecureRandom) -> Result<String, PasswordError> {
    generate(rng, DEFAULT_GENERATED_LENGTH)
}
