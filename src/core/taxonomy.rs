use super::ids::TermId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// A category term in a hierarchical taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<TermId>,
}

/// Lowercase, hyphen-separated form of a term or page name
#[must_use]
pub fn slugify(name: &str) -> String {
    NON_SLUG
        .replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Billing / Account"), "billing-account");
        assert_eq!(slugify("User Dashboard"), "user-dashboard");
        assert_eq!(slugify("  Technical Issue! "), "technical-issue");
    }
}
