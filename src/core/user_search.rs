//! Typo-tolerant ranking of mention candidates.

use std::collections::HashSet;

use chat_client::User;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Distance assigned to a missing name so that nameless users rank on id alone.
pub const MISSING_NAME_DISTANCE: usize = 1000;

/// Lower-cases `text` and strips diacritics (`"Amélie"` becomes `"amelie"`).
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect()
}

/// Levenshtein distance over grapheme clusters. Inputs are compared as
/// given; callers normalize first.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<&str> = a.graphemes(true).collect();
    let b: Vec<&str> = b.graphemes(true).collect();
    strsim::generic_levenshtein(&a, &b)
}

fn distance(user: &User, normalized_query: &str) -> usize {
    let id_distance = levenshtein(&normalize(&user.id), normalized_query);
    let name_distance = user
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| levenshtein(&normalize(name), normalized_query))
        .unwrap_or(MISSING_NAME_DISTANCE);
    id_distance.min(name_distance)
}

/// Filters `users` to those whose id or name contains `query` (case and
/// diacritic insensitive) and ranks them by edit distance, ties broken by id.
///
/// `excluding_id` is dropped from the result, duplicates are collapsed by id
/// keeping the first occurrence, and an empty query matches every user.
pub fn search_users(users: &[User], query: &str, excluding_id: Option<&str>) -> Vec<User> {
    let query = normalize(query);
    let mut seen: HashSet<&str> = HashSet::new();

    let mut ranked: Vec<(usize, &User)> = Vec::new();

    for user in users {
        if excluding_id == Some(user.id.as_str()) {
            continue;
        }
        let matches = query.is_empty()
            || normalize(&user.id).contains(&query)
            || normalize(user.name.as_deref().unwrap_or("")).contains(&query);
        if matches && seen.insert(user.id.as_str()) {
            ranked.push((distance(user, &query), user));
        }
    }

    ranked.sort_by(|(left_distance, left), (right_distance, right)| {
        left_distance
            .cmp(right_distance)
            .then_with(|| left.id.cmp(&right.id))
    });

    ranked.into_iter().map(|(_, user)| user.clone()).collect()
}
