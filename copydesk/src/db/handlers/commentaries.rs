//! Database repository for commentaries.

use crate::types::{abbrev_uuid, CommentaryId, UserId};
use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::commentaries::{
            CommentaryCreateDBRequest, CommentaryDBResponse, CommentaryUpdateDBRequest,
        },
    },
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Commentaries<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Commentaries<'c> {
    type CreateRequest = CommentaryCreateDBRequest;
    type UpdateRequest = CommentaryUpdateDBRequest;
    type Response = CommentaryDBResponse;
    type Id = CommentaryId;

    #[instrument(skip(self, request), fields(article_id = %abbrev_uuid(&request.article_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let commentary_id = Uuid::new_v4();

        let commentary = sqlx::query_as::<_, CommentaryDBResponse>(
            r#"
            INSERT INTO commentaries (id, content, state, creator_id, article_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(commentary_id)
        .bind(&request.content)
        .bind(request.state)
        .bind(request.creator_id)
        .bind(request.article_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(commentary)
    }

    #[instrument(skip(self), fields(commentary_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let commentary =
            sqlx::query_as::<_, CommentaryDBResponse>("SELECT * FROM commentaries WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;
        Ok(commentary)
    }

    #[instrument(skip(self, request), fields(commentary_id = %abbrev_uuid(&id), state = ?request.state), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let commentary = sqlx::query_as::<_, CommentaryDBResponse>(
            "UPDATE commentaries SET state = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(request.state)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(commentary)
    }
}

impl<'c> Commentaries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn ids_by_creator(&mut self, user_id: UserId) -> Result<Vec<CommentaryId>> {
        let ids = sqlx::query_scalar::<_, CommentaryId>(
            "SELECT id FROM commentaries WHERE creator_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(ids)
    }
}
