use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::resource::{FileType, Resource};
use crate::domain::subscriber::{Subscriber, SubscriberChanges};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_status::SubscriberStatus;
use crate::store::{ResourceStore, StoreError, SubscriberStore};

pub struct PgSubscriberStore {
    db_pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    #[tracing::instrument(
        name = "Find a subscriber by email",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, name, status, source, subscribed_at, welcome_email_sent
            FROM subscribers
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.db_pool)
        .await?;

        row.map(Subscriber::try_from).transpose()
    }

    #[tracing::instrument(
        name = "Insert a new subscriber into the database",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    async fn create(&self, new_subscriber: &NewSubscriber) -> Result<(), StoreError> {
        let name: Option<&str> = new_subscriber.name.as_ref().map(|name| name.as_ref());

        sqlx::query(
            r#"
            INSERT INTO subscribers (id, email, name, status, source, subscribed_at, welcome_email_sent)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_subscriber.email.as_ref())
        .bind(name)
        .bind(SubscriberStatus::Active.as_ref())
        .bind(new_subscriber.source.as_str())
        .bind(new_subscriber.subscribed_at)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(name = "Update a subscriber", skip(self, changes))]
    async fn update(&self, id: Uuid, changes: SubscriberChanges) -> Result<(), StoreError> {
        let status: Option<&str> = changes.status.as_ref().map(|status| status.as_ref());
        let name: Option<&str> = changes.name.as_ref().map(|name| name.as_ref());

        sqlx::query(
            r#"
            UPDATE subscribers
            SET status = COALESCE($2, status),
                name = COALESCE($3, name),
                subscribed_at = COALESCE($4, subscribed_at),
                welcome_email_sent = COALESCE($5, welcome_email_sent)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(name)
        .bind(changes.subscribed_at)
        .bind(changes.welcome_email_sent)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }
}

/// Rows were written by this service or the content backend, so only the status is checked:
/// names and emails are taken as stored.
#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    status: String,
    source: String,
    subscribed_at: DateTime<Utc>,
    welcome_email_sent: bool,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = StoreError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Subscriber {
            id: row.id,
            email: SubscriberEmail::from_stored(row.email),
            name: row.name.map(SubscriberName::from_stored),
            status: SubscriberStatus::parse(&row.status).map_err(StoreError::CorruptRecord)?,
            source: row.source,
            subscribed_at: row.subscribed_at,
            welcome_email_sent: row.welcome_email_sent,
        })
    }
}

pub struct PgResourceStore {
    db_pool: PgPool,
}

impl PgResourceStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    #[tracing::instrument(name = "Find a resource by id", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, filename, cloudinary_url, mime_type, file_type, download_count
            FROM resources
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        row.map(resource_from_row).transpose()
    }

    #[tracing::instrument(name = "Increment the download count of a resource", skip(self))]
    async fn increment_download_count(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE resources SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }
}

fn resource_from_row(row: PgRow) -> Result<Resource, StoreError> {
    let file_type: Option<String> = row.try_get("file_type")?;

    Ok(Resource {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        filename: row.try_get("filename")?,
        cloudinary_url: row.try_get("cloudinary_url")?,
        mime_type: row.try_get("mime_type")?,
        file_type: file_type.as_deref().and_then(FileType::parse),
        download_count: row.try_get("download_count")?,
    })
}
