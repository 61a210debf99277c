use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use rearch::CapsuleHandle;
use thiserror::Error;
use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing::{error, info, instrument};

use crate::{
    paste_id::{IdGenerator, id_generator_capsule},
    paste_repo::{self, PasteRepository, SavePasteError, paste_repository_capsule},
    snippet::SnippetMatcher,
};

/// How many pastes the index page shows.
pub const RECENT_PASTES_LIMIT: u64 = 10;

const CREATED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteView {
    pub id: String,
    pub content: String,
    /// Creation time, formatted for display
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    /// [`None`] when the storage filter matched but the case-insensitive
    /// snippet matcher did not
    pub snippet: Option<String>,
}

pub fn paste_service_capsule(
    CapsuleHandle { mut get, .. }: CapsuleHandle,
) -> Arc<dyn PasteService> {
    let paste_repo = Arc::clone(get.as_ref(paste_repository_capsule));
    let id_generator = Arc::clone(get.as_ref(id_generator_capsule));
    Arc::new(PasteServiceImpl {
        paste_repo,
        id_generator,
    })
}

#[async_trait]
pub trait PasteService: Send + Sync {
    /// Stores `content` under a freshly generated ID and returns that ID.
    async fn create_paste(&self, content: String) -> Result<String, CreatePasteError>;
    async fn get_paste(&self, id: &str) -> Result<PasteView, GetPasteError>;
    async fn recent_pastes(&self) -> Result<Vec<PasteView>, ListPastesError>;
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Error)]
pub enum CreatePasteError {
    #[error("generated paste ID {0} is already taken")]
    IdCollision(String),
    #[error("internal/database error: {0}")]
    Internal(anyhow::Error), // NOTE: no #[from] so we have to be explicit
}

#[derive(Debug, Error)]
pub enum GetPasteError {
    #[error("paste not found")]
    NotFound,
    #[error("internal/database error: {0}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ListPastesError {
    #[error("internal/database error: {0}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is invalid: {0}")]
    InvalidQuery(#[from] regex::Error),
    #[error("internal/database error: {0}")]
    Internal(anyhow::Error),
}

struct PasteServiceImpl {
    paste_repo: Arc<dyn PasteRepository>,
    id_generator: Arc<dyn IdGenerator>,
}

#[async_trait]
impl PasteService for PasteServiceImpl {
    #[instrument(skip(self, content), fields(len = content.len()))]
    async fn create_paste(&self, content: String) -> Result<String, CreatePasteError> {
        let now = OffsetDateTime::now_utc();
        let to_save = paste_repo::Paste {
            id: self.id_generator.generate_id(),
            content,
            created_at: PrimitiveDateTime::new(now.date(), now.time()),
        };

        // NOTE: a collision is not retried; the primary key is the only guard
        match self.paste_repo.save_paste(to_save).await {
            Ok(paste) => {
                info!(id = %paste.id, "Created paste");
                Ok(paste.id)
            }
            Err(SavePasteError::IdTaken(id)) => {
                error!(id = %id, "Generated paste ID collided with an existing paste");
                Err(CreatePasteError::IdCollision(id))
            }
            Err(SavePasteError::Internal(err)) => Err(CreatePasteError::Internal(err)),
        }
    }

    #[instrument(skip(self))]
    async fn get_paste(&self, id: &str) -> Result<PasteView, GetPasteError> {
        match self.paste_repo.retrieve_paste(id).await {
            Ok(Some(paste)) => paste.try_into().map_err(GetPasteError::Internal),
            Ok(None) => Err(GetPasteError::NotFound),
            Err(err) => Err(GetPasteError::Internal(err)),
        }
    }

    #[instrument(skip(self))]
    async fn recent_pastes(&self) -> Result<Vec<PasteView>, ListPastesError> {
        self.paste_repo
            .recent_pastes(RECENT_PASTES_LIMIT)
            .await
            .map_err(ListPastesError::Internal)?
            .into_iter()
            .map(PasteView::try_from)
            .collect::<anyhow::Result<_>>()
            .map_err(ListPastesError::Internal)
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = SnippetMatcher::new(query)?;
        let pastes = self
            .paste_repo
            .search_pastes(query)
            .await
            .map_err(SearchError::Internal)?;

        Ok(pastes
            .into_iter()
            .map(|paste| SearchHit {
                snippet: matcher.extract(&paste.content),
                id: paste.id,
            })
            .collect())
    }
}

impl TryFrom<paste_repo::Paste> for PasteView {
    type Error = anyhow::Error;

    fn try_from(
        paste_repo::Paste {
            id,
            content,
            created_at,
        }: paste_repo::Paste,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id,
            content,
            created_at: created_at
                .format(CREATED_AT_FORMAT)
                .context("Failed to format creation timestamp")?,
        })
    }
}
