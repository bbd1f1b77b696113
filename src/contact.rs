use serde::{Deserialize, Serialize};

/// A single entry of the remote contact list.
///
/// Two contacts are equal when every field matches. For list diffing the
/// phone number alone identifies a contact, see [`Contact::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Contact {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, phone: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            kind: kind.into(),
        }
    }

    /// Stable identity used when diffing two lists.
    pub fn key(&self) -> &str {
        &self.phone
    }
}

pub fn tel_uri(phone: &str) -> String {
    format!("tel:{}", phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_type_field() {
        let contact: Contact =
            serde_json::from_str(r#"{"name":"Alice","phone":"555-1111","type":"mobile"}"#)
                .unwrap();
        assert_eq!(contact, Contact::new("Alice", "555-1111", "mobile"));
        assert_eq!(contact.kind, "mobile");
    }

    #[test]
    fn test_serialize_uses_type_name() {
        let json = serde_json::to_string(&Contact::new("Bob", "555-2222", "work")).unwrap();
        assert!(json.contains(r#""type":"work""#));
        assert!(!json.contains("kind"));
    }

    #[test]
    fn test_equality_is_structural_but_key_is_phone() {
        let a = Contact::new("Alice", "555-1111", "mobile");
        let b = Contact::new("Alice Smith", "555-1111", "home");
        assert_ne!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_tel_uri() {
        let contact = Contact::new("Alice", "555-1111", "mobile");
        assert_eq!(tel_uri(contact.key()), "tel:555-1111");
        assert_eq!(tel_uri("+1 (555) 000"), "tel:+1 (555) 000");
    }
}
