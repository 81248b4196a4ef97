//! Persistence for books.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use catalog_db::Database;
use catalog_http::error::AppError;
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::{Book, NewBook};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if catalog_db::is_unavailable(&err) {
            StoreError::Unavailable(err)
        } else {
            StoreError::Query(err)
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => AppError::database_unavailable(e.to_string()),
            StoreError::Query(e) => AppError::database(e.to_string()),
        }
    }
}

/// Storage operations the HTTP handlers depend on.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books ordered by id.
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<Book>, StoreError>;

    /// Insert a row and return it with its assigned id.
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Replace every column of an existing row. `None` when the id is unknown.
    async fn replace(&self, id: u64, book: NewBook) -> Result<Option<Book>, StoreError>;
}

/// MySQL-backed store over the shared pool.
#[derive(Debug, Clone)]
pub struct MySqlBookStore {
    database: Database,
}

impl MySqlBookStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl BookStore for MySqlBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, `description`, cover, price FROM books ORDER BY id",
        )
        .fetch_all(self.database.pool())
        .await?;
        Ok(books)
    }

    async fn get(&self, id: u64) -> Result<Option<Book>, StoreError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, `description`, cover, price FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.database.pool())
        .await?;
        Ok(book)
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let result = sqlx::query(
            "INSERT INTO books (title, `description`, cover, price) VALUES (?, ?, ?, ?)",
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.cover)
        .bind(book.price)
        .execute(self.database.pool())
        .await?;

        Ok(book.into_book(result.last_insert_id()))
    }

    async fn replace(&self, id: u64, book: NewBook) -> Result<Option<Book>, StoreError> {
        // MySQL reports changed rows, not matched rows, so an unchanged
        // replace looks like a miss; re-read instead of trusting rows_affected.
        sqlx::query(
            "UPDATE books SET title = ?, `description` = ?, cover = ?, price = ? WHERE id = ?",
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.cover)
        .bind(book.price)
        .bind(id)
        .execute(self.database.pool())
        .await?;

        self.get(id).await
    }
}

/// In-process store for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: RwLock<Vec<Book>>,
    last_id: AtomicU64,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().await.clone())
    }

    async fn get(&self, id: u64) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let book = book.into_book(id);
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn replace(&self, id: u64, book: NewBook) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        Ok(books.iter_mut().find(|b| b.id == id).map(|slot| {
            *slot = book.into_book(id);
            slot.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            description: None,
            cover: None,
            price: Some(9.99),
        }
    }

    #[tokio::test]
    async fn memory_store_assigns_increasing_ids() {
        let store = MemoryBookStore::new();
        let first = store.insert(new_book("Dune")).await.unwrap();
        let second = store.insert(new_book("Emma")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn memory_store_replace_keeps_id() {
        let store = MemoryBookStore::new();
        let book = store.insert(new_book("Dune")).await.unwrap();

        let replaced = store
            .replace(book.id, new_book("Dune Messiah"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, book.id);
        assert_eq!(replaced.title, "Dune Messiah");
        assert_eq!(store.get(book.id).await.unwrap(), Some(replaced));
    }

    #[tokio::test]
    async fn memory_store_replace_unknown_id_is_none() {
        let store = MemoryBookStore::new();
        assert!(store.replace(42, new_book("Ghost")).await.unwrap().is_none());
    }

    #[test]
    fn pool_timeout_maps_to_service_unavailable() {
        let err: AppError = StoreError::from(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn query_failure_maps_to_internal_error() {
        let err: AppError = StoreError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// Runs the MySQL statements against a real server:
    /// `CATALOG_DATABASE__URL=mysql://... cargo test -- --ignored`
    #[tokio::test]
    #[ignore = "needs a live MySQL server in CATALOG_DATABASE__URL"]
    async fn mysql_store_insert_list_replace() {
        use catalog_kernel::settings::DatabaseSettings;
        use catalog_kernel::Module;
        use std::sync::Arc;

        let Ok(url) = std::env::var("CATALOG_DATABASE__URL") else {
            eprintln!("CATALOG_DATABASE__URL not set; skipping");
            return;
        };
        let database = Database::connect_lazy(&DatabaseSettings {
            url,
            ..DatabaseSettings::default()
        })
        .unwrap();

        let schema: Vec<_> = crate::books::BooksModule::new(Arc::new(MemoryBookStore::new()))
            .schema()
            .into_iter()
            .map(|statement| ("books".to_string(), statement))
            .collect();
        database.ensure_schema(&schema).await.unwrap();

        let store = MySqlBookStore::new(database.clone());
        let inserted = store
            .insert(NewBook {
                title: "Dune".to_string(),
                description: Some("Sci-fi".to_string()),
                cover: None,
                price: Some(9.5),
            })
            .await
            .unwrap();
        assert!(inserted.id > 0);

        let listed = store.list().await.unwrap();
        assert!(listed.contains(&inserted));
        assert!(listed.windows(2).all(|pair| pair[0].id < pair[1].id));

        // Same values twice: MySQL reports zero changed rows for the second one.
        for _ in 0..2 {
            let replaced = store
                .replace(inserted.id, new_book("Dune Messiah"))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(replaced.id, inserted.id);
            assert_eq!(replaced.title, "Dune Messiah");
            assert_eq!(replaced.price, Some(9.99));
        }

        assert!(store.replace(u64::MAX, new_book("Ghost")).await.unwrap().is_none());
        assert_eq!(
            store.get(inserted.id).await.unwrap().unwrap().title,
            "Dune Messiah"
        );

        database.close().await;
    }
}
