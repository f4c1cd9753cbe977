use serde::{Deserialize, Serialize};

use crate::dns_query::normalize_domain;

/// How configured names are compared with query names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The name itself or any name below it, on label boundaries.
    #[default]
    Suffix,
    /// Plain substring match anywhere in the query name.
    Contains,
}

/// A configured name: `example.com` covers the name and everything below it,
/// `*.example.com` covers only names below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPattern {
    base: String,
    subdomains_only: bool,
}

impl DomainPattern {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let (rest, subdomains_only) = match trimmed.strip_prefix("*.") {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let base = normalize_domain(rest);
        if base.is_empty() || base.contains('*') || base.split('.').any(str::is_empty) {
            return Err(format!("Invalid domain pattern '{}'", raw));
        }

        Ok(Self {
            base,
            subdomains_only,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn subdomains_only(&self) -> bool {
        self.subdomains_only
    }

    /// `name` must already be normalized.
    pub fn matches(&self, name: &str, mode: MatchMode) -> bool {
        if self.subdomains_only && name == self.base {
            return false;
        }

        match mode {
            MatchMode::Contains => name.contains(self.base.as_str()),
            MatchMode::Suffix => {
                if name == self.base {
                    return true;
                }
                name.len() > self.base.len()
                    && name.ends_with(self.base.as_str())
                    && name.as_bytes()[name.len() - self.base.len() - 1] == b'.'
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_respects_label_boundaries() {
        let pattern = DomainPattern::parse("opendns.com").unwrap();
        assert!(pattern.matches("opendns.com", MatchMode::Suffix));
        assert!(pattern.matches("dashboard.opendns.com", MatchMode::Suffix));
        assert!(!pattern.matches("notopendns.com", MatchMode::Suffix));
        assert!(!pattern.matches("opendns.com.evil.net", MatchMode::Suffix));
    }

    #[test]
    fn test_contains_is_substring() {
        let pattern = DomainPattern::parse("opendns.com").unwrap();
        assert!(pattern.matches("notopendns.com", MatchMode::Contains));
        assert!(pattern.matches("opendns.com.evil.net", MatchMode::Contains));
        assert!(!pattern.matches("opendns.org", MatchMode::Contains));
    }

    #[test]
    fn test_wildcard_excludes_apex() {
        let pattern = DomainPattern::parse("*.Example.COM.").unwrap();
        assert_eq!(pattern.base(), "example.com");
        assert!(pattern.matches("www.example.com", MatchMode::Suffix));
        assert!(!pattern.matches("example.com", MatchMode::Suffix));
        assert!(!pattern.matches("example.com", MatchMode::Contains));
    }

    #[test]
    fn test_rejects_malformed_patterns() {
        assert!(DomainPattern::parse("").is_err());
        assert!(DomainPattern::parse("*.").is_err());
        assert!(DomainPattern::parse("a..b").is_err());
        assert!(DomainPattern::parse("foo.*.com").is_err());
    }
}
