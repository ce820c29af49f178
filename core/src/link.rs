use std::fmt;

use log::debug;
use url::{ParseError as UrlParseError, Url};

use crate::error::ParseError;

/// Identifier of one embeddable video, taken from a link's `v` parameter.
///
/// Always non-empty. "No identifier" is expressed as `Option<VideoId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Wrap an identifier that is already known to be valid, e.g. from config.
    /// Returns `None` for an empty or blank string.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract the video identifier from a pasted link.
///
/// The link must parse as a URL and carry exactly one non-empty `v` query
/// parameter. Links pasted without a scheme (`youtube.com/watch?v=...`) are
/// retried once as `https://`.
pub fn parse(raw: &str) -> Result<VideoId, ParseError> {
    let raw = raw.trim();
    let url = parse_url(raw).ok_or_else(|| ParseError::InvalidUrl(raw.to_string()))?;

    let mut values = url
        .query_pairs()
        .filter(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned());

    let id = match (values.next(), values.next()) {
        (Some(id), None) => id,
        (Some(_), Some(_)) => {
            debug!("Link has more than one v parameter: {}", raw);
            return Err(ParseError::InvalidUrl(raw.to_string()));
        }
        _ => return Err(ParseError::InvalidUrl(raw.to_string())),
    };

    VideoId::new(id).ok_or_else(|| ParseError::InvalidUrl(raw.to_string()))
}

fn parse_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(UrlParseError::RelativeUrlWithoutBase)
            if !raw.is_empty() && !raw.contains(char::is_whitespace) =>
        {
            Url::parse(&format!("https://{}", raw)).ok()
        }
        Err(_) => None,
    }
}
