//! Text encodings shared with the Store
//!
//! Vectors are written as pgvector literals (`[0.100000,0.200000]`), list columns
//! come back as Postgres array literals (`{a,b,"c d"}`).

use catalogsearch_common::{CatalogSearchError, Result};

/// Encode a vector as a bracketed list of fixed-precision decimals
pub fn encode_vector(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{:.6}", v)).collect();
    format!("[{}]", parts.join(","))
}

/// Encode a list as a Postgres array literal
pub fn encode_text_array(items: &[String]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| {
            let needs_quotes = item.is_empty()
                || item.eq_ignore_ascii_case("null")
                || item.chars().any(|c| matches!(c, ',' | '{' | '}' | '"' | '\\') || c.is_whitespace());
            if needs_quotes {
                format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                item.clone()
            }
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}

/// Split a delimiter-encoded list column back into items
///
/// Accepts Postgres array literals and plain comma-separated text. Quotes and
/// escapes only mean something inside a `{...}` literal; plain text is split
/// on commas as-is. Unquoted `NULL` elements are dropped, as are empty
/// unquoted elements.
pub fn decode_text_array(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let Some(rest) = trimmed.strip_prefix('{') else {
        let mut items = Vec::new();
        for part in trimmed.split(',') {
            push_element(&mut items, part, false);
        }
        return Ok(items);
    };
    let inner = rest
        .strip_suffix('}')
        .ok_or_else(|| CatalogSearchError::serialization(format!("unterminated array literal '{}'", trimmed)))?;

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(CatalogSearchError::serialization("dangling escape in array literal")),
            },
            ',' if !in_quotes => {
                push_element(&mut items, &current, quoted);
                current.clear();
                quoted = false;
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(CatalogSearchError::serialization(format!("unterminated quote in '{}'", trimmed)));
    }
    push_element(&mut items, &current, quoted);

    Ok(items)
}

fn push_element(items: &mut Vec<String>, raw: &str, quoted: bool) {
    if quoted {
        items.push(raw.to_string());
        return;
    }
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return;
    }
    items.push(value.to_string());
}

/// Space-join tags, skipping blanks
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_vector_fixed_precision() {
        assert_eq!(encode_vector(&[0.1, -2.0, 0.0]), "[0.100000,-2.000000,0.000000]");
        assert_eq!(encode_vector(&[]), "[]");
    }

    #[test]
    fn test_decode_text_array_postgres_literal() {
        assert_eq!(
            decode_text_array("{kitchen,\"home decor\",NULL,\"a,b\"}").unwrap(),
            vec!["kitchen", "home decor", "a,b"]
        );
        assert_eq!(decode_text_array("{}").unwrap(), Vec::<String>::new());
        assert_eq!(decode_text_array("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_decode_text_array_plain_list() {
        assert_eq!(decode_text_array("clothing, tops").unwrap(), vec!["clothing", "tops"]);
        assert_eq!(
            decode_text_array("12\" records, collectors, null").unwrap(),
            vec!["12\" records", "collectors"]
        );
        assert_eq!(decode_text_array("back\\slash").unwrap(), vec!["back\\slash"]);
    }

    #[test]
    fn test_decode_text_array_malformed() {
        assert!(decode_text_array("{kitchen,home").is_err());
        assert!(decode_text_array("{\"kitchen}").is_err());
    }

    #[test]
    fn test_text_array_literal_survives_store() {
        let items = vec!["home decor".to_string(), "say \"hi\"".to_string(), "plain".to_string()];
        assert_eq!(decode_text_array(&encode_text_array(&items)).unwrap(), items);
    }

    #[test]
    fn test_join_tags() {
        let tags = vec!["students".to_string(), " ".to_string(), "remote workers".to_string()];
        assert_eq!(join_tags(&tags), "students remote workers");
    }
}
