//! Trigger parsing and routing
//!
//! An inbound invocation is parsed into a [`Trigger`] and routed into the
//! relay flow. Thin dispatch only — no policy lives here.

use thiserror::Error;

/// Default number of records fetched for a `latest` trigger
pub const DEFAULT_FETCH_LIMIT: usize = 25;

/// What a relay invocation should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Relay the most recent undelivered records
    Latest { limit: usize },
    /// Relay specific records by key
    Keys { keys: Vec<String> },
}

/// Trigger parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The trigger word was not recognized.
    #[error("Unknown trigger: {0}")]
    UnknownTrigger(String),

    /// The fetch limit was not a number.
    #[error("Invalid fetch limit: {0}")]
    InvalidLimit(String),

    /// A `keys` trigger named no keys.
    #[error("Trigger 'keys' requires at least one record key")]
    MissingKeys,
}

impl Trigger {
    /// Parse trigger arguments
    ///
    /// No arguments defaults to `latest` with [`DEFAULT_FETCH_LIMIT`].
    ///
    /// # Errors
    /// If the trigger word is unknown or its arguments are malformed
    pub fn parse(args: &[String]) -> Result<Self, DispatchError> {
        let mut iter = args.iter();
        match iter.next().map(String::as_str) {
            None => Ok(Self::Latest {
                limit: DEFAULT_FETCH_LIMIT,
            }),
            Some("latest") => match iter.next() {
                None => Ok(Self::Latest {
                    limit: DEFAULT_FETCH_LIMIT,
                }),
                Some(raw) => raw
                    .parse()
                    .map(|limit| Self::Latest { limit })
                    .map_err(|_| DispatchError::InvalidLimit(raw.clone())),
            },
            Some("keys") => {
                let keys: Vec<String> = iter.cloned().collect();
                if keys.is_empty() {
                    Err(DispatchError::MissingKeys)
                } else {
                    Ok(Self::Keys { keys })
                }
            }
            Some(other) => Err(DispatchError::UnknownTrigger(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_no_arguments_defaults_to_latest() {
        assert_eq!(
            Trigger::parse(&[]),
            Ok(Trigger::Latest {
                limit: DEFAULT_FETCH_LIMIT
            })
        );
    }

    #[test]
    fn test_latest_with_limit() {
        assert_eq!(
            Trigger::parse(&args(&["latest", "50"])),
            Ok(Trigger::Latest { limit: 50 })
        );
        assert_eq!(
            Trigger::parse(&args(&["latest"])),
            Ok(Trigger::Latest {
                limit: DEFAULT_FETCH_LIMIT
            })
        );
    }

    #[test]
    fn test_latest_with_bad_limit() {
        assert_eq!(
            Trigger::parse(&args(&["latest", "many"])),
            Err(DispatchError::InvalidLimit("many".to_string()))
        );
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            Trigger::parse(&args(&["keys", "order-1", "order-2"])),
            Ok(Trigger::Keys {
                keys: vec!["order-1".to_string(), "order-2".to_string()]
            })
        );
        assert_eq!(
            Trigger::parse(&args(&["keys"])),
            Err(DispatchError::MissingKeys)
        );
    }

    #[test]
    fn test_unknown_trigger() {
        assert_eq!(
            Trigger::parse(&args(&["replay"])),
            Err(DispatchError::UnknownTrigger("replay".to_string()))
        );
    }
}
