//! crates/metadata/src/principal.rs

use std::fmt;

/// A remote principal name split into its account and optional domain.
///
/// NFSv4 servers send owners as `name` or `name@domain`. Only the account part
/// participates in local resolution; the domain is kept for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrincipalName<'a> {
    account: &'a str,
    domain: Option<&'a str>,
}

impl<'a> PrincipalName<'a> {
    /// Splits `name` at the first `@`.
    #[must_use]
    pub fn parse(name: &'a str) -> Self {
        match name.split_once('@') {
            Some((account, domain)) => Self {
                account,
                domain: Some(domain),
            },
            None => Self {
                account: name,
                domain: None,
            },
        }
    }

    /// The lookup key.
    #[must_use]
    pub const fn account(&self) -> &'a str {
        self.account
    }

    /// Text after the first `@`, if any.
    #[must_use]
    pub const fn domain(&self) -> Option<&'a str> {
        self.domain
    }
}

impl fmt::Display for PrincipalName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.domain {
            Some(domain) => write!(f, "{}@{}", self.account, domain),
            None => f.write_str(self.account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_first_at_sign() {
        let name = PrincipalName::parse("alice@example.com");
        assert_eq!(name.account(), "alice");
        assert_eq!(name.domain(), Some("example.com"));

        let nested = PrincipalName::parse("svc@corp@example.com");
        assert_eq!(nested.account(), "svc");
        assert_eq!(nested.domain(), Some("corp@example.com"));
    }

    #[test]
    fn bare_name_has_no_domain() {
        let name = PrincipalName::parse("bob");
        assert_eq!(name.account(), "bob");
        assert_eq!(name.domain(), None);
    }

    #[test]
    fn trailing_at_gives_empty_domain() {
        let name = PrincipalName::parse("bob@");
        assert_eq!(name.account(), "bob");
        assert_eq!(name.domain(), Some(""));
        assert_eq!(name.to_string(), "bob@");
    }

    #[test]
    fn leading_at_gives_empty_account() {
        let name = PrincipalName::parse("@example.com");
        assert_eq!(name.account(), "");
        assert_eq!(name.domain(), Some("example.com"));
    }
}
