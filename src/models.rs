use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn new(raw: &str) -> Result<Self, AuthorNameEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(AuthorNameEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for AuthorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("This field may not be blank.")]
pub struct AuthorNameEmptyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(raw: &str) -> Result<Self, BookTitleEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(BookTitleEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("This field may not be blank.")]
pub struct BookTitleEmptyError;

/// Free-form genre label, matched by exact equality when filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre(String);

impl Genre {
    pub fn new(raw: &str) -> Result<Self, GenreEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(GenreEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("This field may not be blank.")]
pub struct GenreEmptyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: i64,
    name: AuthorName,
}

impl Author {
    pub const fn new(id: i64, name: AuthorName) -> Self {
        Self { id, name }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: i64,
    title: BookTitle,
    genre: Genre,
    author_id: i64,
}

impl Book {
    pub const fn new(id: i64, title: BookTitle, genre: Genre, author_id: i64) -> Self {
        Self {
            id,
            title,
            genre,
            author_id,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> &BookTitle {
        &self.title
    }

    pub const fn genre(&self) -> &Genre {
        &self.genre
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }
}

#[derive(Debug)]
pub struct CreateAuthorRequest {
    name: AuthorName,
}

impl CreateAuthorRequest {
    pub const fn new(name: AuthorName) -> Self {
        Self { name }
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct CreateAuthorError(#[from] pub anyhow::Error);

#[derive(Debug)]
pub struct FindAuthorRequest {
    id: i64,
}

impl FindAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum FindAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindAllAuthorsError(#[from] pub anyhow::Error);

#[derive(Debug)]
pub struct UpdateAuthorRequest {
    id: i64,
    name: Option<AuthorName>,
}

impl UpdateAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id, name: None }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn name(&self) -> Option<&AuthorName> {
        self.name.as_ref()
    }

    pub fn set_name(&mut self, name: AuthorName) {
        self.name = Some(name);
    }
}

#[derive(Error, Debug)]
pub enum UpdateAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct DeleteAuthorRequest {
    id: i64,
}

impl DeleteAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum DeleteAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct CreateBookRequest {
    title: BookTitle,
    genre: Genre,
    author_id: i64,
}

impl CreateBookRequest {
    pub const fn new(title: BookTitle, genre: Genre, author_id: i64) -> Self {
        Self {
            title,
            genre,
            author_id,
        }
    }

    pub const fn title(&self) -> &BookTitle {
        &self.title
    }

    pub const fn genre(&self) -> &Genre {
        &self.genre
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }
}

#[derive(Error, Debug)]
pub enum CreateBookError {
    #[error("Author with id \"{author_id}\" does not exist")]
    UnknownAuthor { author_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct FindBookRequest {
    id: i64,
}

impl FindBookRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum FindBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

/// Equality filters for the book listing. Absent fields impose no constraint.
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    author_name: Option<String>,
    title: Option<String>,
    genre: Option<String>,
}

impl BookFilter {
    pub const fn new(
        author_name: Option<String>,
        title: Option<String>,
        genre: Option<String>,
    ) -> Self {
        Self {
            author_name,
            title,
            genre,
        }
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindBooksError(#[from] pub anyhow::Error);

#[derive(Debug)]
pub struct UpdateBookRequest {
    id: i64,
    title: Option<BookTitle>,
    genre: Option<Genre>,
    author_id: Option<i64>,
}

impl UpdateBookRequest {
    pub const fn new(id: i64) -> Self {
        Self {
            id,
            title: None,
            genre: None,
            author_id: None,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> Option<&BookTitle> {
        self.title.as_ref()
    }

    pub fn set_title(&mut self, title: BookTitle) {
        self.title = Some(title);
    }

    pub const fn genre(&self) -> Option<&Genre> {
        self.genre.as_ref()
    }

    pub fn set_genre(&mut self, genre: Genre) {
        self.genre = Some(genre);
    }

    pub const fn author_id(&self) -> Option<i64> {
        self.author_id
    }

    pub fn set_author_id(&mut self, author_id: i64) {
        self.author_id = Some(author_id);
    }

    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.genre.is_none() && self.author_id.is_none()
    }
}

#[derive(Error, Debug)]
pub enum UpdateBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error("Author with id \"{author_id}\" does not exist")]
    UnknownAuthor { author_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug)]
pub struct DeleteBookRequest {
    id: i64,
}

impl DeleteBookRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum DeleteBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An account able to present credentials. Only staff accounts may write.
#[derive(Debug, Clone)]
pub struct User {
    id: i64,
    username: String,
    password_hash: String,
    is_staff: bool,
    is_active: bool,
}

impl User {
    pub const fn new(
        id: i64,
        username: String,
        password_hash: String,
        is_staff: bool,
        is_active: bool,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            is_staff,
            is_active,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub const fn is_staff(&self) -> bool {
        self.is_staff
    }

    pub const fn is_active(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug)]
pub struct CreateUserRequest {
    username: String,
    password_hash: String,
    is_staff: bool,
}

impl CreateUserRequest {
    pub fn new(username: &str, password_hash: String, is_staff: bool) -> Self {
        Self {
            username: username.into(),
            password_hash,
            is_staff,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub const fn is_staff(&self) -> bool {
        self.is_staff
    }
}

#[derive(Error, Debug)]
pub enum CreateUserError {
    #[error("User with username \"{username}\" already exists")]
    Duplicate { username: String },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct CredentialStoreError(#[from] pub anyhow::Error);
