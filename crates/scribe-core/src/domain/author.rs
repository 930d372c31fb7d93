use serde::{Deserialize, Serialize};

/// Shown while an author lookup is still in flight.
pub const LOADING_PLACEHOLDER: &str = "Loading…";
/// Shown when an author could not be resolved.
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";

/// Display-safe slice of a user record. Nothing else from the record leaves
/// the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub name: String,
    pub email: String,
}

/// State of an author lookup as a view sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorLookup {
    Pending,
    Resolved(AuthorProfile),
    Unavailable,
}

impl AuthorLookup {
    pub fn display_name(&self) -> &str {
        match self {
            AuthorLookup::Pending => LOADING_PLACEHOLDER,
            AuthorLookup::Resolved(profile) if !profile.name.trim().is_empty() => &profile.name,
            AuthorLookup::Resolved(_) | AuthorLookup::Unavailable => UNKNOWN_PLACEHOLDER,
        }
    }
}

impl From<Option<AuthorProfile>> for AuthorLookup {
    fn from(profile: Option<AuthorProfile>) -> Self {
        match profile {
            Some(p) => AuthorLookup::Resolved(p),
            None => AuthorLookup::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(AuthorLookup::Pending.display_name(), "Loading…");
        assert_eq!(AuthorLookup::from(None).display_name(), "Unknown");
        let blank = AuthorProfile {
            name: " ".into(),
            email: "a@x.com".into(),
        };
        assert_eq!(AuthorLookup::Resolved(blank).display_name(), "Unknown");
    }
}
