//! Database repository for articles, their author/editor link tables, and
//! the id listings backing `GET /articles`.

use crate::types::{abbrev_uuid, ArticleId, CommentaryId, UserId};
use crate::{
    api::models::articles::ArticleState,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::articles::{ArticleCreateDBRequest, ArticleDBResponse, ArticleUpdateDBRequest},
    },
};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Article {
    pub id: ArticleId,
    pub name: String,
    pub content: String,
    pub state: ArticleState,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Articles<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Articles<'c> {
    type CreateRequest = ArticleCreateDBRequest;
    type UpdateRequest = ArticleUpdateDBRequest;
    type Response = ArticleDBResponse;
    type Id = ArticleId;

    /// Insert the article and its creator author link atomically, so the
    /// creator-is-an-author invariant holds from the first moment the row
    /// is visible.
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let article_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;
        let article = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (id, name, content, creator_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(article_id)
        .bind(&request.name)
        .bind(&request.content)
        .bind(request.creator_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO article_authors (article_id, user_id) VALUES ($1, $2)")
            .bind(article_id)
            .bind(request.creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ArticleDBResponse {
            id: article.id,
            name: article.name,
            content: article.content,
            state: article.state,
            creator_id: article.creator_id,
            authors: vec![request.creator_id],
            editors: vec![],
            commentaries: vec![],
            created_at: article.created_at,
            updated_at: article.updated_at,
        })
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match article {
            Some(article) => Ok(Some(self.assemble(article).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, request), fields(article_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            UPDATE articles SET
                name = COALESCE($2, name),
                content = COALESCE($3, content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.content)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        self.assemble(article).await
    }
}

impl<'c> Articles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Attach the author/editor sets and approved commentary ids to a row
    async fn assemble(&mut self, article: Article) -> Result<ArticleDBResponse> {
        let authors = sqlx::query_scalar::<_, UserId>("SELECT user_id FROM article_authors WHERE article_id = $1")
            .bind(article.id)
            .fetch_all(&mut *self.db)
            .await?;
        let editors = sqlx::query_scalar::<_, UserId>("SELECT user_id FROM article_editors WHERE article_id = $1")
            .bind(article.id)
            .fetch_all(&mut *self.db)
            .await?;
        let commentaries = sqlx::query_scalar::<_, CommentaryId>(
            "SELECT id FROM commentaries WHERE article_id = $1 AND state = 'approved' ORDER BY created_at",
        )
        .bind(article.id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(ArticleDBResponse {
            id: article.id,
            name: article.name,
            content: article.content,
            state: article.state,
            creator_id: article.creator_id,
            authors,
            editors,
            commentaries,
            created_at: article.created_at,
            updated_at: article.updated_at,
        })
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&id), state = ?state), err)]
    pub async fn set_state(&mut self, id: ArticleId, state: ArticleState) -> Result<ArticleDBResponse> {
        let article = sqlx::query_as::<_, Article>(
            "UPDATE articles SET state = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(state)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        self.assemble(article).await
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&article_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn add_author(&mut self, article_id: ArticleId, user_id: UserId) -> Result<()> {
        self.add_link("article_authors", article_id, user_id).await
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&article_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn remove_author(&mut self, article_id: ArticleId, user_id: UserId) -> Result<()> {
        self.remove_link("article_authors", article_id, user_id).await
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&article_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn add_editor(&mut self, article_id: ArticleId, user_id: UserId) -> Result<()> {
        self.add_link("article_editors", article_id, user_id).await
    }

    #[instrument(skip(self), fields(article_id = %abbrev_uuid(&article_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn remove_editor(&mut self, article_id: ArticleId, user_id: UserId) -> Result<()> {
        self.remove_link("article_editors", article_id, user_id).await
    }

    async fn add_link(&mut self, table: &str, article_id: ArticleId, user_id: UserId) -> Result<()> {
        let sql = format!("INSERT INTO {table} (article_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING");
        match sqlx::query(&sql).bind(article_id).bind(user_id).execute(&mut *self.db).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // Foreign key violation means either article or user doesn't exist
                Err(DbError::NotFound)
            }
            Err(e) => Err(DbError::from(e)),
        }
    }

    async fn remove_link(&mut self, table: &str, article_id: ArticleId, user_id: UserId) -> Result<()> {
        let sql = format!("DELETE FROM {table} WHERE article_id = $1 AND user_id = $2");
        let result = sqlx::query(&sql).bind(article_id).bind(user_id).execute(&mut *self.db).await?;
        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    // Id listings. Membership filtering happens in SQL, not by scanning
    // materialized sets on the host side.

    #[instrument(skip(self), err)]
    pub async fn approved_ids(&mut self) -> Result<Vec<ArticleId>> {
        let ids = sqlx::query_scalar::<_, ArticleId>(
            "SELECT id FROM articles WHERE state = 'approved' ORDER BY created_at DESC",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(ids)
    }

    #[instrument(skip(self), err)]
    pub async fn published_ids(&mut self) -> Result<Vec<ArticleId>> {
        let ids = sqlx::query_scalar::<_, ArticleId>(
            "SELECT id FROM articles WHERE state = 'published' ORDER BY created_at DESC",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(ids)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn published_ids_authored_by(&mut self, user_id: UserId) -> Result<Vec<ArticleId>> {
        let ids = sqlx::query_scalar::<_, ArticleId>(
            r#"
            SELECT a.id FROM articles a
            JOIN article_authors aa ON aa.article_id = a.id
            WHERE a.state = 'published' AND aa.user_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(ids)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn ids_created_by(&mut self, user_id: UserId) -> Result<Vec<ArticleId>> {
        let ids = sqlx::query_scalar::<_, ArticleId>(
            "SELECT id FROM articles WHERE creator_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(ids)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn ids_authored_by(&mut self, user_id: UserId) -> Result<Vec<ArticleId>> {
        self.linked_ids("article_authors", user_id).await
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn ids_edited_by(&mut self, user_id: UserId) -> Result<Vec<ArticleId>> {
        self.linked_ids("article_editors", user_id).await
    }

    async fn linked_ids(&mut self, table: &str, user_id: UserId) -> Result<Vec<ArticleId>> {
        let sql = format!(
            "SELECT a.id FROM articles a JOIN {table} l ON l.article_id = a.id \
             WHERE l.user_id = $1 ORDER BY a.created_at DESC"
        );
        let ids = sqlx::query_scalar::<_, ArticleId>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(ids)
    }
}
