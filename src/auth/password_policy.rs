//! Strength rules applied when an account changes its password.

use std::{collections::HashSet, sync::OnceLock};

pub const MIN_LENGTH: usize = 8;
const MAX_SIMILARITY: f64 = 0.7;

/// Bundled list of widely reused passwords, one per line, lowercase. It is a
/// short blocklist, not an exhaustive breach corpus.
const COMMON_PASSWORDS: &str = include_str!("common_passwords.txt");

static COMMON_SET: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn is_common(password: &str) -> bool {
    let set = COMMON_SET.get_or_init(|| {
        COMMON_PASSWORDS
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    });
    set.contains(password.trim().to_lowercase().as_str())
}

/// Returns every rule the password breaks; empty means accepted.
/// `attributes` are account values (username, email) the password must not
/// resemble.
pub fn validate(password: &str, attributes: &[(&str, &str)]) -> Vec<String> {
    let mut problems = Vec::new();

    if let Some(message) = check_similarity(password, attributes) {
        problems.push(message);
    }

    if password.chars().count() < MIN_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_LENGTH
        ));
    }

    if is_common(password) {
        problems.push("This password is too common.".to_string());
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }

    problems
}

fn check_similarity(password: &str, attributes: &[(&str, &str)]) -> Option<String> {
    let password: Vec<char> = password.to_lowercase().chars().collect();
    if password.is_empty() {
        return None;
    }

    for (name, value) in attributes {
        if value.is_empty() {
            continue;
        }

        let lowered = value.to_lowercase();
        let mut parts: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|p| !p.is_empty())
            .collect();
        parts.push(lowered.as_str());

        for part in parts {
            let part: Vec<char> = part.chars().collect();
            if similarity(&password, &part) >= MAX_SIMILARITY {
                return Some(format!("The password is too similar to the {}.", name));
            }
        }
    }

    None
}

/// Ratcliff/Obershelp ratio: twice the matched characters over total length.
fn similarity(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * matching_chars(a, b)) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];

    for i in 0..a.len() {
        let mut current = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                current[j + 1] = previous[j] + 1;
                if current[j + 1] > best.2 {
                    best = (i + 1 - current[j + 1], j + 1 - current[j + 1], current[j + 1]);
                }
            }
        }
        previous = current;
    }

    best
}
