//! Schema naming
//!
//! Pure string helpers that turn API locations into registry keys. Output must
//! be stable across runs since collision suffixes depend on registration order.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

// Plural -> singular for words the suffix rules get wrong
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("criteria", "criterion"),
];

/// Lowercase `value` and collapse every run of non-alphanumeric characters
/// into a single underscore, trimming underscores at both ends.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    NON_ALNUM_REGEX
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Registry key for the body of one response:
/// `/users/{id}`, `GET`, `200` -> `users_id_get_200_response`.
pub fn response_key(path: &str, method: &str, response: &str) -> String {
    let parts: Vec<String> = [path, method, response]
        .iter()
        .map(|part| slugify(part))
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        return "response".to_string();
    }
    format!("{}_response", parts.join("_"))
}

/// Singular form of an English plural key, used to name array item schemas.
///
/// Only the trailing word changes, so `orderItems` becomes `orderItem` and
/// `line_items` becomes `line_item`. Keys that are not recognisably plural are
/// returned unchanged.
pub fn singularize(key: &str) -> String {
    let lower = key.to_ascii_lowercase();

    for (plural, singular) in IRREGULAR_PLURALS {
        if lower.ends_with(plural) && word_boundary_before(key, key.len() - plural.len()) {
            let stem = &key[..key.len() - plural.len()];
            return format!("{stem}{}", match_case(&key[key.len() - plural.len()..], singular));
        }
    }

    let strip = |suffix_len: usize, replacement: &str| {
        format!("{}{replacement}", &key[..key.len() - suffix_len])
    };

    if lower.len() > 3 && lower.ends_with("ies") {
        return strip(3, if key.ends_with("IES") { "Y" } else { "y" });
    }

    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return strip(2, "");
        }
    }

    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return key.to_string();
    }

    if lower.len() > 1 && lower.ends_with('s') {
        return strip(1, "");
    }

    key.to_string()
}

fn word_boundary_before(key: &str, index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let before = key.as_bytes()[index - 1];
    let first = key.as_bytes()[index];
    !before.is_ascii_alphanumeric() || (before.is_ascii_lowercase() && first.is_ascii_uppercase())
}

fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("/users/{id}/orders"), "users_id_orders");
        assert_eq!(slugify("  Hello,  World!! "), "hello_world");
        assert_eq!(slugify("/"), "");
    }

    #[test]
    fn test_response_key() {
        assert_eq!(response_key("/users/{id}", "GET", "200"), "users_id_get_200_response");
        assert_eq!(
            response_key("/v1/orders.json", "post", "default"),
            "v1_orders_json_post_default_response"
        );
        assert_eq!(response_key("/", "get", "200"), "get_200_response");
    }

    #[test]
    fn test_response_key_is_stable() {
        let first = response_key("/a-b/c", "put", "201");
        let second = response_key("/a-b/c", "put", "201");
        assert_eq!(first, second);
    }

    #[test]
    fn test_singularize_regular_plurals() {
        assert_eq!(singularize("items"), "item");
        assert_eq!(singularize("orders"), "order");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("orderItems"), "orderItem");
        assert_eq!(singularize("line_items"), "line_item");
    }

    #[test]
    fn test_singularize_keeps_non_plurals() {
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("class"), "class");
        assert_eq!(singularize("data"), "data");
        assert_eq!(singularize("s"), "s");
        assert_eq!(singularize(""), "");
    }

    #[test]
    fn test_singularize_irregulars() {
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("children"), "child");
        assert_eq!(singularize("teamMembers"), "teamMember");
        assert_eq!(singularize("salesPeople"), "salesPerson");
        assert_eq!(singularize("human"), "human");
    }
}
