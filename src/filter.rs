use std::borrow::Cow;

use crate::contact::Contact;

/// Substring match on the contact name only. `needle` is already lowercase.
fn name_contains(contact: &Contact, needle: &str) -> bool {
    contact.name.to_lowercase().contains(needle)
}

/// Narrow `all` down to the contacts whose name contains `query`.
///
/// An empty query hands back the input slice itself. Otherwise the result
/// keeps the relative order of `all`.
pub fn filter<'a>(all: &'a [Contact], query: &str) -> Cow<'a, [Contact]> {
    if query.is_empty() {
        return Cow::Borrowed(all);
    }

    let needle = query.to_lowercase();
    Cow::Owned(
        all.iter()
            .filter(|contact| name_contains(contact, &needle))
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Contact> {
        vec![
            Contact::new("Alice", "555-1111", "mobile"),
            Contact::new("Bob", "555-2222", "work"),
            Contact::new("Malika", "555-3333", "home"),
            Contact::new("ALISTAIR", "555-4444", "mobile"),
            Contact::new("Carol", "555-ali", "ali"),
        ]
    }

    #[test]
    fn test_empty_query_returns_same_slice() {
        let all = sample();
        let result = filter(&all, "");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert!(std::ptr::eq(result.as_ref(), all.as_slice()));
    }

    #[test]
    fn test_case_insensitive_order_preserving() {
        let all = sample();
        let result = filter(&all, "ali");
        let names: Vec<&str> = result.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Malika", "ALISTAIR"]);
    }

    #[test]
    fn test_only_name_is_matched() {
        let all = sample();
        let result = filter(&all, "555");
        assert!(result.is_empty());
        let result = filter(&all, "mobile");
        assert!(result.is_empty());
    }

    #[test]
    fn test_no_match() {
        let all = sample();
        assert!(filter(&all, "zed").is_empty());
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let all = vec![
            Contact::new("Ann Lee", "1", "x"),
            Contact::new("Annlee", "2", "x"),
        ];
        let result = filter(&all, "n l");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].phone, "1");
    }

    #[test]
    fn test_result_is_exact_subsequence() {
        let all = sample();
        for query in ["a", "AL", "o", "ice", "x", "B"] {
            let result = filter(&all, query);
            let expected: Vec<Contact> = all
                .iter()
                .filter(|c| c.name.to_lowercase().contains(&query.to_lowercase()))
                .cloned()
                .collect();
            assert_eq!(result.as_ref(), expected.as_slice(), "query {query:?}");
        }
    }

    #[test]
    fn test_unicode_case_folding() {
        let all = vec![Contact::new("Ólafur", "1", "x"), Contact::new("Ирина", "2", "x")];
        assert_eq!(filter(&all, "óla").len(), 1);
        assert_eq!(filter(&all, "ИРИ").len(), 1);
    }
}
