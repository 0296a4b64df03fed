use crate::models::{
    Author, Book, BookFilter, CreateAuthorError, CreateAuthorRequest, CreateBookError,
    CreateBookRequest, CreateUserError, CreateUserRequest, CredentialStoreError, DeleteAuthorError,
    DeleteAuthorRequest, DeleteBookError, DeleteBookRequest, FindAllAuthorsError, FindAuthorError,
    FindAuthorRequest, FindBookError, FindBookRequest, FindBooksError, UpdateAuthorError,
    UpdateAuthorRequest, UpdateBookError, UpdateBookRequest, User,
};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError>;

    async fn find_author(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError>;

    async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError>;

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError>;

    async fn delete_author(&self, req: &DeleteAuthorRequest) -> Result<(), DeleteAuthorError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError>;

    async fn find_book(&self, req: &FindBookRequest) -> Result<Book, FindBookError>;

    async fn find_books(&self, filter: &BookFilter) -> Result<Vec<Book>, FindBooksError>;

    async fn update_book(&self, req: &UpdateBookRequest) -> Result<Book, UpdateBookError>;

    async fn delete_book(&self, req: &DeleteBookRequest) -> Result<(), DeleteBookError>;
}

/// Lookups backing the authentication chain. Lookups never fail on an
/// unknown key; they return `None` instead.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, CredentialStoreError>;

    async fn find_user_by_session(&self, key: &str) -> Result<Option<User>, CredentialStoreError>;

    async fn find_user_by_token(&self, key: &str) -> Result<Option<User>, CredentialStoreError>;

    async fn create_user(&self, req: &CreateUserRequest) -> Result<User, CreateUserError>;

    /// Issues a fresh API token for the user, replacing any previous one.
    async fn issue_token(&self, user_id: i64) -> Result<String, CredentialStoreError>;

    async fn create_session(
        &self,
        user_id: i64,
        ttl: Duration,
    ) -> Result<String, CredentialStoreError>;
}

pub trait Store: AuthorRepository + BookRepository + CredentialRepository {}

impl<T> Store for T where T: AuthorRepository + BookRepository + CredentialRepository {}
