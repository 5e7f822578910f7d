use thiserror::Error;

use encore_core::{NewQueueEntry, PartyId, StoreError};

use crate::{MediaError, TitleResolver, VideoReference};

/// A performer's request to put a song in the queue.
#[derive(Debug, Clone)]
pub struct SongSubmission {
    /// Display name of the performer, used for position lookups.
    pub submitted_by: String,
    /// URL or id of the video to perform to.
    pub media_reference: String,
    /// Fallback title for when resolution comes up empty.
    pub manual_title: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A name is required")]
    MissingName,
    #[error("Not a recognizable video reference")]
    InvalidReference,
    /// The resolver came up empty and no manual title was supplied.
    #[error("A title is required")]
    MissingTitle,
    #[error("Session is no longer running")]
    SessionClosed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<MediaError> for SubmitError {
    fn from(_: MediaError) -> Self {
        Self::InvalidReference
    }
}

impl SongSubmission {
    /// Validates the submission and prepares the row to insert, resolving a
    /// title when none was given by hand.
    pub async fn prepare(
        self,
        party_id: PartyId,
        resolver: &dyn TitleResolver,
    ) -> Result<NewQueueEntry, SubmitError> {
        let submitted_by = self.submitted_by.trim().to_string();

        if submitted_by.is_empty() {
            return Err(SubmitError::MissingName);
        }

        let reference = VideoReference::parse(&self.media_reference)?;

        let title = match resolver.resolve(&reference).await {
            Some(title) => title,
            None => self
                .manual_title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .ok_or(SubmitError::MissingTitle)?,
        };

        Ok(NewQueueEntry {
            party_id,
            title,
            media_reference: reference.id().to_string(),
            submitted_by,
        })
    }
}

#[cfg(test)]
mod test {
    use async_trait::async_trait;

    use super::*;

    struct FixedResolver(Option<&'static str>);

    #[async_trait]
    impl TitleResolver for FixedResolver {
        async fn resolve(&self, _reference: &VideoReference) -> Option<String> {
            self.0.map(Into::into)
        }
    }

    fn submission() -> SongSubmission {
        SongSubmission {
            submitted_by: "alice".to_string(),
            media_reference: "https://youtu.be/z09GolEktUw".to_string(),
            manual_title: None,
        }
    }

    #[tokio::test]
    async fn test_resolved_title_is_used() {
        let new_entry = submission()
            .prepare(1, &FixedResolver(Some("Never Gonna Give You Up")))
            .await
            .unwrap();

        assert_eq!(new_entry.title, "Never Gonna Give You Up");
        assert_eq!(new_entry.media_reference, "z09GolEktUw");
        assert_eq!(new_entry.submitted_by, "alice");
    }

    #[tokio::test]
    async fn test_missing_name_blocks_submission() {
        let result = SongSubmission {
            submitted_by: "   ".to_string(),
            ..submission()
        }
        .prepare(1, &FixedResolver(Some("Song")))
        .await;

        assert!(matches!(result, Err(SubmitError::MissingName)));
    }

    #[tokio::test]
    async fn test_invalid_reference_blocks_submission() {
        let result = SongSubmission {
            media_reference: "definitely not a video".to_string(),
            ..submission()
        }
        .prepare(1, &FixedResolver(Some("Song")))
        .await;

        assert!(matches!(result, Err(SubmitError::InvalidReference)));
    }

    #[tokio::test]
    async fn test_manual_title_backstops_unknown_resolution() {
        let result = submission().prepare(1, &FixedResolver(None)).await;
        assert!(matches!(result, Err(SubmitError::MissingTitle)));

        let new_entry = SongSubmission {
            manual_title: Some("My Song".to_string()),
            ..submission()
        }
        .prepare(1, &FixedResolver(None))
        .await
        .unwrap();

        assert_eq!(new_entry.title, "My Song");
    }
}
