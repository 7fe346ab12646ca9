//! Name translation between database columns (snake_case) and entity properties (camelCase).
//!
//! The two functions are inverses for identifiers made of lowercase ASCII words
//! (`pre_name` <-> `preName`). Digits and runs of uppercase letters do not
//! round-trip: `line_2` -> `line2` -> `line2`, `URLPath` -> `u_r_l_path`.

/// Convert a column name to a property name.
/// e.g. "pre_name" -> "preName", "created_at" -> "createdAt"
pub fn column_to_property(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    for (i, part) in column.split('_').enumerate() {
        if i == 0 {
            out.push_str(part);
        } else {
            out.push_str(&upper_first(part));
        }
    }
    out
}

/// Convert a property name to a column name.
/// e.g. "preName" -> "pre_name", "createdAt" -> "created_at"
pub fn property_to_column(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for (i, c) in property.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Uppercase the first character only ("name" -> "Name").
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character only ("PreName" -> "preName").
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_becomes_camel_case() {
        assert_eq!(column_to_property("pre_name"), "preName");
        assert_eq!(column_to_property("email"), "email");
        assert_eq!(column_to_property("created_at_utc"), "createdAtUtc");
    }

    #[test]
    fn property_becomes_snake_case() {
        assert_eq!(property_to_column("preName"), "pre_name");
        assert_eq!(property_to_column("id"), "id");
        assert_eq!(property_to_column("createdAtUtc"), "created_at_utc");
    }

    #[test]
    fn lowercase_words_round_trip() {
        for property in ["id", "email", "preName", "lastLoginAt", "aBC"] {
            assert_eq!(column_to_property(&property_to_column(property)), property);
        }
        for column in ["id", "email", "pre_name", "last_login_at", "a_b_c"] {
            assert_eq!(property_to_column(&column_to_property(column)), column);
        }
    }

    #[test]
    fn digits_and_acronyms_do_not_round_trip() {
        assert_eq!(column_to_property("line_2"), "line2");
        assert_eq!(property_to_column("line2"), "line2");
        assert_eq!(property_to_column("URLPath"), "u_r_l_path");
    }

    #[test]
    fn first_character_helpers() {
        assert_eq!(upper_first("name"), "Name");
        assert_eq!(lower_first("PreName"), "preName");
        assert_eq!(upper_first(""), "");
    }
}
