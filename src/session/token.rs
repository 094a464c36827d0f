//! Callback payload codec
//!
//! Button payloads carry a short token that points back into a stored
//! result set:
//!
//! - `pick:<index>` / `pick:<index>:<generation>` select a search result
//! - `dl:<audio|video>:<generation>` fetch the pending link in a format
//!
//! Telegram limits callback data to 64 bytes; every encoded payload fits.

use crate::media::MediaFormat;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PICK_PREFIX: &str = "pick";
const FETCH_PREFIX: &str = "dl";

/// Maximum callback data length accepted by Telegram
pub const CALLBACK_DATA_LIMIT: usize = 64;

/// Identifies one stored result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a result set, optionally pinned to the set's generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackToken {
    /// Zero-based item index
    pub index: usize,
    /// Generation the index was issued for
    pub generation: Option<Generation>,
}

impl CallbackToken {
    /// Creates a token
    #[must_use]
    pub const fn new(index: usize, generation: Option<Generation>) -> Self {
        Self { index, generation }
    }
}

/// Errors produced while decoding callback data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackParseError {
    /// Payload does not start with a known action.
    #[error("Unknown callback action: {0}")]
    UnknownAction(String),
    /// A numeric field is missing or not a non-negative integer.
    #[error("Invalid number in callback data: {0}")]
    InvalidNumber(String),
    /// Format name is neither `audio` nor `video`.
    #[error("Unknown media format: {0}")]
    UnknownFormat(String),
    /// Wrong number of `:`-separated fields.
    #[error("Malformed callback data: {0}")]
    Malformed(String),
}

/// Decoded inline button action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Select a search result
    Pick(CallbackToken),
    /// Download the pending link
    Fetch {
        /// Requested media format
        format: MediaFormat,
        /// Token into the link store
        token: CallbackToken,
    },
}

impl CallbackAction {
    /// Payload for the `index`-th result of a set
    #[must_use]
    pub const fn pick(index: usize, generation: Generation) -> Self {
        Self::Pick(CallbackToken::new(index, Some(generation)))
    }

    /// Payload for fetching the link stored under `generation`
    #[must_use]
    pub const fn fetch(format: MediaFormat, generation: Generation) -> Self {
        Self::Fetch {
            format,
            token: CallbackToken::new(0, Some(generation)),
        }
    }

    /// Encodes the action as callback data
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pick(CallbackToken {
                index,
                generation: Some(generation),
            }) => write!(f, "{PICK_PREFIX}:{index}:{generation}"),
            Self::Pick(CallbackToken {
                index,
                generation: None,
            }) => write!(f, "{PICK_PREFIX}:{index}"),
            Self::Fetch { format, token } => match token.generation {
                Some(generation) => write!(f, "{FETCH_PREFIX}:{}:{generation}", format.as_str()),
                None => write!(f, "{FETCH_PREFIX}:{}", format.as_str()),
            },
        }
    }
}

fn parse_number(field: &str) -> Result<u64, CallbackParseError> {
    // `u64::from_str` accepts a leading '+'
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CallbackParseError::InvalidNumber(field.to_string()));
    }
    field
        .parse()
        .map_err(|_| CallbackParseError::InvalidNumber(field.to_string()))
}

fn parse_index(field: &str) -> Result<usize, CallbackParseError> {
    let value = parse_number(field)?;
    usize::try_from(value).map_err(|_| CallbackParseError::InvalidNumber(field.to_string()))
}

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut parts = data.split(':');
        let action = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        match action {
            PICK_PREFIX => match fields.as_slice() {
                [index] => Ok(Self::Pick(CallbackToken::new(parse_index(index)?, None))),
                [index, generation] => Ok(Self::pick(
                    parse_index(index)?,
                    Generation(parse_number(generation)?),
                )),
                _ => Err(CallbackParseError::Malformed(data.to_string())),
            },
            FETCH_PREFIX => match fields.as_slice() {
                [format, generation] => {
                    let format = MediaFormat::from_str(format)
                        .map_err(|()| CallbackParseError::UnknownFormat((*format).to_string()))?;
                    Ok(Self::fetch(format, Generation(parse_number(generation)?)))
                }
                _ => Err(CallbackParseError::Malformed(data.to_string())),
            },
            other => Err(CallbackParseError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_pick() {
        assert_eq!(
            "pick:3".parse::<CallbackAction>(),
            Ok(CallbackAction::Pick(CallbackToken::new(3, None)))
        );
    }

    #[test]
    fn test_pick_roundtrip() {
        let action = CallbackAction::pick(7, Generation(12345));
        assert_eq!(action.encode(), "pick:7:12345");
        assert_eq!(action.encode().parse::<CallbackAction>(), Ok(action));
    }

    #[test]
    fn test_fetch_roundtrip() {
        let action = CallbackAction::fetch(MediaFormat::Audio, Generation(9));
        assert_eq!(action.encode(), "dl:audio:9");
        assert_eq!("dl:audio:9".parse::<CallbackAction>(), Ok(action));
        assert!(matches!(
            "dl:video:10".parse::<CallbackAction>(),
            Ok(CallbackAction::Fetch {
                format: MediaFormat::Video,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_negative_and_garbage_indices() {
        assert_eq!(
            "pick:-1".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidNumber("-1".to_string()))
        );
        assert_eq!(
            "pick:+1".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidNumber("+1".to_string()))
        );
        assert_eq!(
            "pick:".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidNumber(String::new()))
        );
        assert!("pick:99999999999999999999999".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn test_rejects_unknown_payloads() {
        assert_eq!(
            "mp3|https://youtu.be/x".parse::<CallbackAction>(),
            Err(CallbackParseError::UnknownAction("mp3|https".to_string()))
        );
        assert_eq!(
            "dl:flac:1".parse::<CallbackAction>(),
            Err(CallbackParseError::UnknownFormat("flac".to_string()))
        );
        assert!(matches!(
            "pick:1:2:3".parse::<CallbackAction>(),
            Err(CallbackParseError::Malformed(_))
        ));
        assert!(matches!(
            "dl:audio".parse::<CallbackAction>(),
            Err(CallbackParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_encoded_payload_fits_telegram_limit() {
        let action = CallbackAction::pick(usize::MAX, Generation(u64::MAX));
        assert!(action.encode().len() <= CALLBACK_DATA_LIMIT);
    }
}
