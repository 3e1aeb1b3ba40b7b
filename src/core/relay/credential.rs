//! Upstream credential check performed before a session starts.

/// Message sent downstream when no provider key is configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "OPENAI_API_KEY is not configured";

/// Result of checking the configured provider key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    Present(&'a str),
    Absent,
}

impl<'a> Credential<'a> {
    /// Empty and whitespace-only keys count as absent.
    pub fn check(api_key: Option<&'a str>) -> Self {
        match api_key {
            Some(key) if !key.trim().is_empty() => Credential::Present(key),
            _ => Credential::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Credential::Present(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_check() {
        assert_eq!(Credential::check(Some("sk-1")), Credential::Present("sk-1"));
        assert_eq!(Credential::check(None), Credential::Absent);
        assert_eq!(Credential::check(Some("")), Credential::Absent);
        assert!(!Credential::check(Some(" \t")).is_present());
    }
}
