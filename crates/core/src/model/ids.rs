use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque token grouping the answers of one quiz attempt.
///
/// Tokens minted here are v4 UUIDs, but any non-empty string read from a
/// route or an import file is accepted as-is.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps an existing token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Mints a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 1-based position of a question in the bank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionNumber(u32);

impl QuestionNumber {
    /// The first question of every bank.
    pub const FIRST: Self = Self(1);

    #[must_use]
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Zero-based index into the bank, or `None` for the invalid number 0.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()?.checked_sub(1)
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    #[must_use]
    pub fn prev(self) -> Option<Self> {
        match self.0 {
            0 | 1 => None,
            n => Some(Self(n - 1)),
        }
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({})", self.0)
    }
}

impl fmt::Debug for QuestionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionNumber({})", self.0)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an id from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for SessionToken {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdError {
                kind: "SessionToken",
            });
        }
        Ok(Self(s.to_owned()))
    }
}

impl FromStr for QuestionNumber {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(QuestionNumber::new).map_err(|_| ParseIdError {
            kind: "QuestionNumber",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_distinct() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!("".parse::<SessionToken>().is_err());
        assert!("  ".parse::<SessionToken>().is_err());
        let token: SessionToken = "abc".parse().unwrap();
        assert_eq!(token.to_string(), "abc");
    }

    #[test]
    fn question_number_steps_stay_positive() {
        assert_eq!(QuestionNumber::FIRST.prev(), None);
        assert_eq!(QuestionNumber::new(0).prev(), None);
        assert_eq!(QuestionNumber::new(2).prev(), Some(QuestionNumber::FIRST));
        assert_eq!(QuestionNumber::new(2).next(), Some(QuestionNumber::new(3)));
        assert_eq!(QuestionNumber::new(u32::MAX).next(), None);
    }

    #[test]
    fn question_number_index_is_zero_based() {
        assert_eq!(QuestionNumber::new(1).index(), Some(0));
        assert_eq!(QuestionNumber::new(0).index(), None);
    }

    #[test]
    fn question_number_from_str() {
        let n: QuestionNumber = "12".parse().unwrap();
        assert_eq!(n, QuestionNumber::new(12));
        assert!("-3".parse::<QuestionNumber>().is_err());
        assert!("summary".parse::<QuestionNumber>().is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&SessionToken::new("s-1")).unwrap();
        assert_eq!(json, "\"s-1\"");
        let n: QuestionNumber = serde_json::from_str("7").unwrap();
        assert_eq!(n.value(), 7);
    }
}
