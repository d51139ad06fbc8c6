//! Display-name normalization for physical-table lookup.
//!
//! Survey exports wrap display names in double quotes inconsistently, so all
//! matching between topology rows and physical rows goes through
//! [`normalized_name`].

/// Strip surrounding whitespace and one layer of surrounding double quotes.
pub fn normalized_name(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// Find the row whose (normalized) name matches `name` (also normalized).
pub fn find_by_name<'a, T>(
    rows: &'a [T],
    name: &str,
    key: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    let wanted = normalized_name(name);
    rows.iter().find(|r| normalized_name(key(r)) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_whitespace() {
        assert_eq!(normalized_name("\"Canal Alto\""), "Canal Alto");
        assert_eq!(normalized_name("  Canal Alto "), "Canal Alto");
        assert_eq!(normalized_name("Canal \"Alto\""), "Canal \"Alto\"");
    }

    #[test]
    fn lookup_matches_across_quoting() {
        let rows = vec![("\"Presa Norte\"", 1), ("Presa Sur", 2)];
        let hit = find_by_name(&rows, "Presa Norte", |r| r.0);
        assert_eq!(hit.map(|r| r.1), Some(1));
        let hit = find_by_name(&rows, "\"Presa Sur\"", |r| r.0);
        assert_eq!(hit.map(|r| r.1), Some(2));
    }
}
