use crate::http::payload::{Fields, json_type_name};
use crate::models::{
    Author, AuthorName, Book, BookFilter, BookTitle, CreateAuthorRequest, CreateBookRequest,
    FindAuthorError, FindAuthorRequest, Genre, UpdateAuthorRequest, UpdateBookRequest,
};
use crate::repositories::AuthorRepository;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

const REQUIRED: &str = "This field is required.";
const NULL: &str = "This field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";

/// Validation messages keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid fields: {0:?}")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<FieldErrors> for DecodeError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Whether absent fields are errors (`Full`) or left untouched (`Partial`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Partial,
}

pub fn unknown_author_message(author_id: i64) -> String {
    format!("Invalid pk \"{author_id}\" - object does not exist.")
}

fn text<T, E: std::fmt::Display>(
    fields: &Fields,
    name: &str,
    mode: Mode,
    errors: &mut FieldErrors,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Option<T> {
    let raw = match fields.get(name) {
        None if mode == Mode::Full => {
            errors.add(name, REQUIRED);
            return None;
        }
        None => return None,
        Some(Value::Null) => {
            errors.add(name, NULL);
            return None;
        }
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => {
            errors.add(name, NOT_A_STRING);
            return None;
        }
    };

    parse(&raw)
        .map_err(|err| errors.add(name, err.to_string()))
        .ok()
}

fn primary_key(fields: &Fields, name: &str, mode: Mode, errors: &mut FieldErrors) -> Option<i64> {
    let value = match fields.get(name) {
        None if mode == Mode::Full => {
            errors.add(name, REQUIRED);
            return None;
        }
        None => return None,
        Some(value) => value,
    };

    let id = match value {
        Value::Null => {
            errors.add(name, NULL);
            return None;
        }
        Value::String(raw) if raw.is_empty() => {
            errors.add(name, NULL);
            return None;
        }
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    };

    if id.is_none() {
        errors.add(
            name,
            format!(
                "Incorrect type. Expected pk value, received {}.",
                json_type_name(value)
            ),
        );
    }
    id
}

async fn resolve_author<AR>(
    authors: &AR,
    author_id: i64,
    errors: &mut FieldErrors,
) -> Result<(), DecodeError>
where
    AR: AuthorRepository + ?Sized,
{
    match authors.find_author(&FindAuthorRequest::new(author_id)).await {
        Ok(_) => Ok(()),
        Err(FindAuthorError::NotFound { id }) => {
            errors.add("author", unknown_author_message(id));
            Ok(())
        }
        Err(FindAuthorError::Other(err)) => Err(DecodeError::Store(err)),
    }
}

struct BookFields {
    title: Option<BookTitle>,
    genre: Option<Genre>,
    author_id: Option<i64>,
}

async fn book_fields<AR>(
    fields: &Fields,
    mode: Mode,
    authors: &AR,
) -> Result<BookFields, DecodeError>
where
    AR: AuthorRepository + ?Sized,
{
    let mut errors = FieldErrors::default();
    let title = text(fields, "title", mode, &mut errors, BookTitle::new);
    let genre = text(fields, "genre", mode, &mut errors, Genre::new);
    let author_id = primary_key(fields, "author", mode, &mut errors);
    if let Some(author_id) = author_id {
        resolve_author(authors, author_id, &mut errors).await?;
    }

    if errors.is_empty() {
        Ok(BookFields {
            title,
            genre,
            author_id,
        })
    } else {
        Err(errors.into())
    }
}

/// Validates a complete book, resolving its author reference.
pub async fn decode_new_book<AR>(
    fields: &Fields,
    authors: &AR,
) -> Result<CreateBookRequest, DecodeError>
where
    AR: AuthorRepository + ?Sized,
{
    match book_fields(fields, Mode::Full, authors).await? {
        BookFields {
            title: Some(title),
            genre: Some(genre),
            author_id: Some(author_id),
        } => Ok(CreateBookRequest::new(title, genre, author_id)),
        _ => Err(FieldErrors::single("non_field_errors", "Incomplete book.").into()),
    }
}

pub async fn decode_book_changes<AR>(
    id: i64,
    fields: &Fields,
    mode: Mode,
    authors: &AR,
) -> Result<UpdateBookRequest, DecodeError>
where
    AR: AuthorRepository + ?Sized,
{
    let BookFields {
        title,
        genre,
        author_id,
    } = book_fields(fields, mode, authors).await?;

    let mut req = UpdateBookRequest::new(id);
    if let Some(title) = title {
        req.set_title(title);
    }
    if let Some(genre) = genre {
        req.set_genre(genre);
    }
    if let Some(author_id) = author_id {
        req.set_author_id(author_id);
    }
    Ok(req)
}

pub fn decode_new_author(fields: &Fields) -> Result<CreateAuthorRequest, FieldErrors> {
    let mut errors = FieldErrors::default();
    match text(fields, "name", Mode::Full, &mut errors, AuthorName::new) {
        Some(name) => Ok(CreateAuthorRequest::new(name)),
        None => Err(errors),
    }
}

pub fn decode_author_changes(
    id: i64,
    fields: &Fields,
    mode: Mode,
) -> Result<UpdateAuthorRequest, FieldErrors> {
    let mut errors = FieldErrors::default();
    let name = text(fields, "name", mode, &mut errors, AuthorName::new);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut req = UpdateAuthorRequest::new(id);
    if let Some(name) = name {
        req.set_name(name);
    }
    Ok(req)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookHttpResponse {
    id: i64,
    title: String,
    genre: String,
    author: i64,
}

impl From<Book> for BookHttpResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id(),
            title: book.title().to_string(),
            genre: book.genre().to_string(),
            author: book.author_id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorHttpResponse {
    id: i64,
    name: String,
}

impl From<Author> for AuthorHttpResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id(),
            name: author.name().to_string(),
        }
    }
}

/// Query parameters accepted by the book listing. Unknown keys are ignored and
/// the last occurrence of a repeated key wins.
#[derive(Debug, Default)]
pub struct BookFilterQuery {
    author_name: Option<String>,
    title: Option<String>,
    genre: Option<String>,
}

impl FromIterator<(String, String)> for BookFilterQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut query = Self::default();
        for (key, value) in iter {
            let slot = match key.as_str() {
                "author__name" => &mut query.author_name,
                "title" => &mut query.title,
                "genre" => &mut query.genre,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }
}

/// Blank values impose no constraint.
impl From<BookFilterQuery> for BookFilter {
    fn from(query: BookFilterQuery) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self::new(
            present(query.author_name),
            present(query.title),
            present(query.genre),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CreateAuthorError, DeleteAuthorError, DeleteAuthorRequest, FindAllAuthorsError,
        UpdateAuthorError,
    };
    use async_trait::async_trait;
    use serde_json::json;

    /// Knows exactly one author, id 1.
    struct SingleAuthor;

    #[async_trait]
    impl AuthorRepository for SingleAuthor {
        async fn create_author(
            &self,
            _req: &CreateAuthorRequest,
        ) -> Result<Author, CreateAuthorError> {
            unimplemented!()
        }

        async fn find_author(&self, req: &FindAuthorRequest) -> Result<Author, FindAuthorError> {
            if req.id() == 1 {
                Ok(Author::new(1, AuthorName::new_unchecked("Ada Lovelace".into())))
            } else {
                Err(FindAuthorError::NotFound { id: req.id() })
            }
        }

        async fn find_all_authors(&self) -> Result<Vec<Author>, FindAllAuthorsError> {
            unimplemented!()
        }

        async fn update_author(
            &self,
            _req: &UpdateAuthorRequest,
        ) -> Result<Author, UpdateAuthorError> {
            unimplemented!()
        }

        async fn delete_author(
            &self,
            _req: &DeleteAuthorRequest,
        ) -> Result<(), DeleteAuthorError> {
            unimplemented!()
        }
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map.into(),
            _ => panic!("test payload must be an object"),
        }
    }

    fn invalid(result: Result<impl std::fmt::Debug, DecodeError>) -> FieldErrors {
        match result {
            Err(DecodeError::Invalid(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_book_decodes() {
        let payload = fields(json!({"title": "Notes", "genre": "math", "author": 1, "id": 99}));
        let req = decode_new_book(&payload, &SingleAuthor).await.unwrap();
        assert_eq!(req.title().as_str(), "Notes");
        assert_eq!(req.genre().as_str(), "math");
        assert_eq!(req.author_id(), 1);
    }

    #[tokio::test]
    async fn form_encoded_author_id_is_accepted() {
        let payload: Fields = [
            ("title".to_string(), "Notes".to_string()),
            ("genre".to_string(), "math".to_string()),
            ("author".to_string(), "1".to_string()),
        ]
        .into_iter()
        .collect();
        let req = decode_new_book(&payload, &SingleAuthor).await.unwrap();
        assert_eq!(req.author_id(), 1);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_by_name() {
        let payload = fields(json!({"genre": "math"}));
        let errors = invalid(decode_new_book(&payload, &SingleAuthor).await);
        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("author"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("genre"), None);
    }

    #[tokio::test]
    async fn malformed_values_are_reported_as_data() {
        let payload = fields(json!({"title": "  ", "genre": ["x"], "author": true}));
        let errors = invalid(decode_new_book(&payload, &SingleAuthor).await);
        assert_eq!(
            errors.get("title"),
            Some(&["This field may not be blank.".to_string()][..])
        );
        assert_eq!(errors.get("genre"), Some(&[NOT_A_STRING.to_string()][..]));
        assert_eq!(
            errors.get("author"),
            Some(&["Incorrect type. Expected pk value, received bool.".to_string()][..])
        );
    }

    #[tokio::test]
    async fn unresolved_author_is_a_field_error() {
        let payload = fields(json!({"title": "Notes", "genre": "math", "author": 9}));
        let errors = invalid(decode_new_book(&payload, &SingleAuthor).await);
        assert_eq!(errors.get("author"), Some(&[unknown_author_message(9)][..]));
    }

    #[tokio::test]
    async fn partial_changes_only_touch_supplied_fields() {
        let payload = fields(json!({"genre": "poetry"}));
        let req = decode_book_changes(4, &payload, Mode::Partial, &SingleAuthor)
            .await
            .unwrap();
        assert_eq!(req.id(), 4);
        assert_eq!(req.genre().map(Genre::as_str), Some("poetry"));
        assert!(req.title().is_none());
        assert!(req.author_id().is_none());
    }

    #[tokio::test]
    async fn full_changes_require_every_field() {
        let payload = fields(json!({"genre": "poetry"}));
        let errors = invalid(decode_book_changes(4, &payload, Mode::Full, &SingleAuthor).await);
        assert!(errors.get("title").is_some());
        assert!(errors.get("author").is_some());
    }

    #[tokio::test]
    async fn empty_form_author_is_treated_as_null() {
        let payload: Fields = [
            ("title".to_string(), "Notes".to_string()),
            ("genre".to_string(), "math".to_string()),
            ("author".to_string(), String::new()),
        ]
        .into_iter()
        .collect();
        let errors = invalid(decode_new_book(&payload, &SingleAuthor).await);
        assert_eq!(errors.get("author"), Some(&[NULL.to_string()][..]));
    }

    #[test]
    fn filter_query_keeps_last_value_and_drops_blanks() {
        let query: BookFilterQuery = [
            ("genre", "poetry"),
            ("genre", "math"),
            ("title", ""),
            ("ordering", "-id"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let filter = BookFilter::from(query);
        assert_eq!(filter.genre(), Some("math"));
        assert_eq!(filter.title(), None);
        assert_eq!(filter.author_name(), None);
    }

    #[test]
    fn author_name_is_required_and_not_null() {
        let errors = decode_new_author(&Fields::default()).unwrap_err();
        assert_eq!(errors.get("name"), Some(&[REQUIRED.to_string()][..]));

        let errors = decode_new_author(&fields(json!({"name": null}))).unwrap_err();
        assert_eq!(errors.get("name"), Some(&[NULL.to_string()][..]));
    }

    #[test]
    fn field_errors_serialize_as_a_plain_map() {
        let errors = FieldErrors::single("title", REQUIRED);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"title": [REQUIRED]})
        );
    }

    #[test]
    fn book_encodes_author_as_its_id() {
        let book = Book::new(
            7,
            BookTitle::new_unchecked("Notes".into()),
            Genre::new_unchecked("math".into()),
            1,
        );
        assert_eq!(
            serde_json::to_value(BookHttpResponse::from(book)).unwrap(),
            json!({"id": 7, "title": "Notes", "genre": "math", "author": 1})
        );
    }
}
