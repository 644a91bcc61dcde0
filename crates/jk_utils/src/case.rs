//! Identifier case conversion used by field rename rules.

use alloc::string::String;

/// Converts a `snake_case` identifier to `camelCase`.
///
/// Leading underscores are kept; each later underscore is dropped and the
/// following character is upper-cased.
///
/// # Examples
///
/// ```
/// use jk_utils::case::to_camel_case;
///
/// assert_eq!(to_camel_case("field_name"), "fieldName");
/// assert_eq!(to_camel_case("_private_id"), "_privateId");
/// assert_eq!(to_camel_case("plain"), "plain");
/// ```
pub fn to_camel_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let body = ident.trim_start_matches('_');
    out.push_str(&ident[..ident.len() - body.len()]);

    let mut upper = false;
    for ch in body.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Converts a `snake_case` identifier to `PascalCase`.
///
/// ```
/// use jk_utils::case::to_pascal_case;
///
/// assert_eq!(to_pascal_case("field_name"), "FieldName");
/// ```
pub fn to_pascal_case(ident: &str) -> String {
    let camel = to_camel_case(ident.trim_start_matches('_'));
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_underscores() {
        assert_eq!(to_camel_case("a__b"), "aB");
        assert_eq!(to_camel_case("trailing_"), "trailing");
        assert_eq!(to_pascal_case(""), "");
    }
}
