use crate::auth::generate_key;
use crate::models::{
    Author, AuthorName, Book, BookFilter, BookTitle, CreateAuthorError, CreateAuthorRequest,
    CreateBookError, CreateBookRequest, CreateUserError, CreateUserRequest, CredentialStoreError,
    DeleteAuthorError, DeleteAuthorRequest, DeleteBookError, DeleteBookRequest,
    FindAllAuthorsError, FindAuthorError, FindAuthorRequest, FindBookError, FindBookRequest,
    FindBooksError, Genre, UpdateAuthorError, UpdateAuthorRequest, UpdateBookError,
    UpdateBookRequest, User,
};
use crate::repositories::{AuthorRepository, BookRepository, CredentialRepository};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

static MIGRATOR: Migrator = sqlx::migrate!();

const BOOK_COLUMNS: &str = "book.id, book.title, book.genre, book.author_id";
const USER_COLUMNS: &str = concat!(
    "auth_user.id, auth_user.username, auth_user.password_hash, ",
    "auth_user.is_staff, auth_user.is_active"
);

pub async fn establish_pool(path: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(path)
        .with_context(|| format!("Invalid database path {path}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(path: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = establish_pool(path, max_connections).await?;
        Ok(Self::new(pool))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let name = row.try_get("name")?;

        Ok(Self::new(id, AuthorName::new_unchecked(name)))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let title = row.try_get("title")?;
        let genre = row.try_get("genre")?;
        let author_id = row.try_get("author_id")?;

        let title = BookTitle::new_unchecked(title);
        let genre = Genre::new_unchecked(genre);
        Ok(Self::new(id, title, genre, author_id))
    }
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let username = row.try_get("username")?;
        let password_hash = row.try_get("password_hash")?;
        let is_staff = row.try_get("is_staff")?;
        let is_active = row.try_get("is_active")?;

        Ok(Self::new(id, username, password_hash, is_staff, is_active))
    }
}

#[async_trait]
impl AuthorRepository for SqliteStore {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError> {
        let author = sqlx::query_as("INSERT INTO author (name) VALUES (?) RETURNING id, name")
            .bind(req.name().to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                anyhow!(err).context(format!(
                    r#"Failed to create author with name "{}""#,
                    req.name()
                ))
            })?;

        Ok(author)
    }

    async fn find_author(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError> {
        let author = sqlx::query_as("SELECT id, name FROM author WHERE id = ?")
            .bind(req.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if matches!(err, sqlx::Error::RowNotFound) {
                    FindAuthorError::NotFound { id: req.id() }
                } else {
                    let err = anyhow!(err).context(format!(
                        r#"Failed to retrieve author with id "{}""#,
                        req.id()
                    ));
                    FindAuthorError::Other(err)
                }
            })?;

        Ok(author)
    }

    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError> {
        let authors = sqlx::query_as("SELECT id, name FROM author ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context("Failed to retrieve all authors");
                FindAllAuthorsError(err)
            })?;

        Ok(authors)
    }

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError> {
        let Some(name) = req.name() else {
            return self
                .find_author(&FindAuthorRequest::new(req.id()))
                .await
                .map_err(|err| match err {
                    FindAuthorError::NotFound { id } => UpdateAuthorError::NotFound { id },
                    FindAuthorError::Other(err) => UpdateAuthorError::Other(err),
                });
        };

        let author = sqlx::query_as("UPDATE author SET name = ? WHERE id = ? RETURNING id, name")
            .bind(name.to_string())
            .bind(req.id())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to update author with id "{}""#, req.id()));
                UpdateAuthorError::Other(err)
            })?;

        author.ok_or(UpdateAuthorError::NotFound { id: req.id() })
    }

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError> {
        let result = sqlx::query("DELETE FROM author WHERE id = ?")
            .bind(req.id())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                anyhow!(err).context(format!(r#"Failed to delete author with id "{}""#, req.id()))
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteAuthorError::NotFound { id: req.id() });
        }

        Ok(())
    }
}

#[async_trait]
impl BookRepository for SqliteStore {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError> {
        let book = sqlx::query_as(
            "INSERT INTO book (title, genre, author_id) VALUES (?, ?, ?) \
             RETURNING id, title, genre, author_id",
        )
        .bind(req.title().to_string())
        .bind(req.genre().to_string())
        .bind(req.author_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                CreateBookError::UnknownAuthor {
                    author_id: req.author_id(),
                }
            } else {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create book with title "{}""#,
                    req.title()
                ));
                CreateBookError::Other(err)
            }
        })?;

        Ok(book)
    }

    async fn find_book(&self, req: &FindBookRequest) -> Result<Book, FindBookError> {
        let book = sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM book WHERE book.id = ?"))
            .bind(req.id())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if matches!(err, sqlx::Error::RowNotFound) {
                    FindBookError::NotFound { id: req.id() }
                } else {
                    let err = anyhow!(err)
                        .context(format!(r#"Failed to retrieve book with id "{}""#, req.id()));
                    FindBookError::Other(err)
                }
            })?;

        Ok(book)
    }

    async fn find_books(&self, filter: &BookFilter) -> Result<Vec<Book>, FindBooksError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {BOOK_COLUMNS} FROM book JOIN author ON author.id = book.author_id"
        ));
        let mut first = true;

        if let Some(author_name) = filter.author_name() {
            push_filter(&mut query, &mut first, "author.name", author_name);
        }
        if let Some(title) = filter.title() {
            push_filter(&mut query, &mut first, "book.title", title);
        }
        if let Some(genre) = filter.genre() {
            push_filter(&mut query, &mut first, "book.genre", genre);
        }
        query.push(" ORDER BY book.id");

        let books = query
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!("Failed to retrieve books with {filter:?}"));
                FindBooksError(err)
            })?;

        Ok(books)
    }

    async fn update_book(&self, req: &UpdateBookRequest) -> Result<Book, UpdateBookError> {
        if req.is_empty() {
            return self
                .find_book(&FindBookRequest::new(req.id()))
                .await
                .map_err(|err| match err {
                    FindBookError::NotFound { id } => UpdateBookError::NotFound { id },
                    FindBookError::Other(err) => UpdateBookError::Other(err),
                });
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE book SET ");
        let mut assignments = query.separated(", ");
        if let Some(title) = req.title() {
            assignments.push("title = ");
            assignments.push_bind_unseparated(title.to_string());
        }
        if let Some(genre) = req.genre() {
            assignments.push("genre = ");
            assignments.push_bind_unseparated(genre.to_string());
        }
        if let Some(author_id) = req.author_id() {
            assignments.push("author_id = ");
            assignments.push_bind_unseparated(author_id);
        }
        query
            .push(" WHERE id = ")
            .push_bind(req.id())
            .push(" RETURNING id, title, genre, author_id");

        let book = query
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| match req.author_id() {
                Some(author_id) if is_foreign_key_violation(&err) => {
                    UpdateBookError::UnknownAuthor { author_id }
                }
                _ => {
                    let err = anyhow!(err)
                        .context(format!(r#"Failed to update book with id "{}""#, req.id()));
                    UpdateBookError::Other(err)
                }
            })?;

        book.ok_or(UpdateBookError::NotFound { id: req.id() })
    }

    async fn delete_book(&self, req: &DeleteBookRequest) -> Result<(), DeleteBookError> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(req.id())
            .execute(&self.pool)
            .await
            .map_err(|err| {
                anyhow!(err).context(format!(r#"Failed to delete book with id "{}""#, req.id()))
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteBookError::NotFound { id: req.id() });
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialRepository for SqliteStore {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, CredentialStoreError> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM auth_user WHERE auth_user.username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!(r#"Failed to retrieve user "{username}""#))?;

        Ok(user)
    }

    async fn find_user_by_session(&self, key: &str) -> Result<Option<User>, CredentialStoreError> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM auth_session \
             JOIN auth_user ON auth_user.id = auth_session.user_id \
             WHERE auth_session.key = ? \
             AND auth_session.expires_at > CAST(strftime('%s', 'now') AS INTEGER)"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to retrieve session")?;

        Ok(user)
    }

    async fn find_user_by_token(&self, key: &str) -> Result<Option<User>, CredentialStoreError> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM auth_token \
             JOIN auth_user ON auth_user.id = auth_token.user_id \
             WHERE auth_token.key = ?"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to retrieve token")?;

        Ok(user)
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<User, CreateUserError> {
        let user = sqlx::query_as(
            "INSERT INTO auth_user (username, password_hash, is_staff) VALUES (?, ?, ?) \
             RETURNING id, username, password_hash, is_staff, is_active",
        )
        .bind(req.username())
        .bind(req.password_hash())
        .bind(req.is_staff())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CreateUserError::Duplicate {
                    username: req.username().to_string(),
                }
            } else {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create user with username "{}""#,
                    req.username()
                ));
                CreateUserError::Other(err)
            }
        })?;

        Ok(user)
    }

    async fn issue_token(&self, user_id: i64) -> Result<String, CredentialStoreError> {
        let key = generate_key();
        sqlx::query(
            "INSERT INTO auth_token (key, user_id) VALUES (?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET key = excluded.key",
        )
        .bind(&key)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .with_context(|| format!(r#"Failed to issue token for user with id "{user_id}""#))?;

        Ok(key)
    }

    async fn create_session(
        &self,
        user_id: i64,
        ttl: Duration,
    ) -> Result<String, CredentialStoreError> {
        let key = generate_key();
        let ttl = i64::try_from(ttl.as_secs()).context("Session lifetime is too long")?;
        sqlx::query(
            "INSERT INTO auth_session (key, user_id, expires_at) \
             VALUES (?, ?, CAST(strftime('%s', 'now') AS INTEGER) + ?)",
        )
        .bind(&key)
        .bind(user_id)
        .bind(ttl)
        .execute(&self.pool)
        .await
        .with_context(|| format!(r#"Failed to create session for user with id "{user_id}""#))?;

        Ok(key)
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, first: &mut bool, column: &str, value: &str) {
    query.push(if *first { " WHERE " } else { " AND " });
    query.push(column).push(" = ").push_bind(value.to_string());
    *first = false;
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_unique_violation();
    }

    false
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_foreign_key_violation();
    }

    false
}
