use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref VIDEO_ID_REGEX: Regex = Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#
    )
    .expect("video id pattern compiles");
    static ref BARE_ID_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("bare id pattern compiles");
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("Not a recognizable video reference")]
    Invalid,
}

/// A reference to the video backing a submission, reduced to its 11-character
/// id. What gets stored and broadcast is the id, not the original URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    id: String,
}

impl VideoReference {
    /// Extracts a video reference from a URL in any of the common shapes,
    /// or from a bare id.
    pub fn parse(input: &str) -> Result<Self, MediaError> {
        let input = input.trim();

        if let Some(captures) = VIDEO_ID_REGEX.captures(input) {
            return Ok(Self {
                id: captures[1].to_string(),
            });
        }

        if BARE_ID_REGEX.is_match(input) {
            return Ok(Self {
                id: input.to_string(),
            });
        }

        Err(MediaError::Invalid)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical watch URL for the referenced video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}
