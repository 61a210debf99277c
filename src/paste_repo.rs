use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use rearch::CapsuleHandle;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DbConn, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr,
};
use thiserror::Error;
use time::PrimitiveDateTime;
use tracing::{instrument, warn};

use crate::{config::db_conn_capsule, orm::paste};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub created_at: PrimitiveDateTime,
}

#[derive(Debug, Error)]
pub enum SavePasteError {
    #[error("a paste with ID {0} already exists")]
    IdTaken(String),
    #[error("internal/database error: {0}")]
    Internal(anyhow::Error),
}

pub fn paste_repository_capsule(
    CapsuleHandle { mut get, .. }: CapsuleHandle,
) -> Arc<dyn PasteRepository> {
    let db = get.as_ref(db_conn_capsule).clone();
    Arc::new(PasteRepositoryImpl { db })
}

#[async_trait]
pub trait PasteRepository: Send + Sync {
    async fn retrieve_paste(&self, id: &str) -> anyhow::Result<Option<Paste>>;

    /// Inserts a brand new [`Paste`]; never overwrites an existing one.
    async fn save_paste(&self, paste: Paste) -> Result<Paste, SavePasteError>;

    /// Returns at most `limit` pastes, newest first.
    async fn recent_pastes(&self, limit: u64) -> anyhow::Result<Vec<Paste>>;

    /// Returns every paste whose content matches `LIKE %fragment%`.
    ///
    /// Case sensitivity is whatever the backend's collation says it is.
    async fn search_pastes(&self, fragment: &str) -> anyhow::Result<Vec<Paste>>;
}

struct PasteRepositoryImpl {
    db: DbConn,
}

#[async_trait]
impl PasteRepository for PasteRepositoryImpl {
    #[instrument(skip(self))]
    async fn retrieve_paste(&self, id: &str) -> anyhow::Result<Option<Paste>> {
        let paste = paste::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("Failed to retrieve paste")?;
        Ok(paste.map(Paste::from))
    }

    #[instrument(skip(self, paste), fields(id = %paste.id, len = paste.content.len()))]
    async fn save_paste(&self, paste: Paste) -> Result<Paste, SavePasteError> {
        let to_insert = paste::ActiveModel {
            id: Set(paste.id.clone()),
            content: Set(paste.content.clone()),
            created_at: Set(paste.created_at),
        };

        match paste::Entity::insert(to_insert)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(paste),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                warn!(?err, "Paste ID collided with an existing paste");
                Err(SavePasteError::IdTaken(paste.id))
            }
            Err(err) => Err(SavePasteError::Internal(
                anyhow::Error::new(err).context("Failed to insert paste"),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn recent_pastes(&self, limit: u64) -> anyhow::Result<Vec<Paste>> {
        let pastes = paste::Entity::find()
            .order_by_desc(paste::Column::CreatedAt)
            .order_by_desc(paste::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("Failed to list recent pastes")?;
        Ok(pastes.into_iter().map(Paste::from).collect())
    }

    #[instrument(skip(self))]
    async fn search_pastes(&self, fragment: &str) -> anyhow::Result<Vec<Paste>> {
        let pastes = paste::Entity::find()
            .filter(paste::Column::Content.contains(fragment))
            .all(&self.db)
            .await
            .context("Failed to search pastes")?;
        Ok(pastes.into_iter().map(Paste::from).collect())
    }
}

impl From<paste::Model> for Paste {
    fn from(
        paste::Model {
            id,
            content,
            created_at,
        }: paste::Model,
    ) -> Self {
        Self {
            id,
            content,
            created_at,
        }
    }
}
