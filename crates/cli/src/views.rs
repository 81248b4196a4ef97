//! Books, add and update views.
//!
//! Views hold their own state and report where to go next; a failed call
//! lands in the view's error state instead of aborting.

use std::fmt::Write as _;

use catalog_app::books::models::Book;

use crate::client::CatalogClient;
use crate::form::{BookFields, FormState};

/// Client-side locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Books,
    Add,
    Update(u64),
}

impl Route {
    /// Parse a location path such as `/`, `/add` or `/update/7`.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path
            .trim()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Route::Books),
            ["add"] => Some(Route::Add),
            ["update", id] => id
                .parse::<u64>()
                .ok()
                .filter(|id| *id > 0)
                .map(Route::Update),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Books => "/".to_string(),
            Route::Add => "/add".to_string(),
            Route::Update(id) => format!("/update/{id}"),
        }
    }
}

/// The book list.
#[derive(Debug, Default)]
pub struct BooksView {
    books: Vec<Book>,
    error: Option<String>,
}

impl BooksView {
    /// Fetch every book from the service.
    pub async fn load(client: &CatalogClient) -> Self {
        match client.list_books().await {
            Ok(books) => Self { books, error: None },
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch books");
                Self {
                    books: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Render as a plain-text table.
    pub fn render(&self) -> String {
        if let Some(error) = &self.error {
            return format!("Could not load books: {error}\n");
        }
        if self.books.is_empty() {
            return "No books yet.\n".to_string();
        }

        let title_width = self
            .books
            .iter()
            .map(|b| b.title.chars().count())
            .max()
            .unwrap_or(0)
            .max("TITLE".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>6}  {:<title_width$}  {:>10}  {:<20}  DESCRIPTION",
            "ID", "TITLE", "PRICE", "COVER"
        );
        for book in &self.books {
            let price = book
                .price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:>6}  {:<title_width$}  {:>10}  {:<20}  {}",
                book.id,
                book.title,
                price,
                book.cover.as_deref().unwrap_or("-"),
                book.description.as_deref().unwrap_or("")
            );
        }
        out
    }
}

/// Form for a new book.
#[derive(Debug, Default)]
pub struct AddView {
    form: FormState<BookFields>,
}

impl AddView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &FormState<BookFields> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState<BookFields> {
        &mut self.form
    }

    /// Send the form; on success the next route is the book list.
    pub async fn submit(&mut self, client: &CatalogClient) -> Option<Route> {
        self.form.clear_error();
        match client.create_book(&self.form.values().to_input()).await {
            Ok(created) => {
                tracing::info!(book_id = created.book.id, "{}", created.message);
                Some(Route::Books)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to create book");
                self.form.fail(err.to_string());
                None
            }
        }
    }
}

/// Form editing an existing book.
#[derive(Debug)]
pub struct UpdateView {
    id: u64,
    form: FormState<BookFields>,
}

impl UpdateView {
    /// Empty form for the book named by `route`; `None` for other routes.
    pub fn for_route(route: Route) -> Option<Self> {
        match route {
            Route::Update(id) => Some(Self {
                id,
                form: FormState::new(),
            }),
            _ => None,
        }
    }

    /// Prefill the form with the stored book.
    pub async fn load(&mut self, client: &CatalogClient) -> bool {
        match client.get_book(self.id).await {
            Ok(book) => {
                self.form = FormState::with_values(BookFields::from_book(&book));
                true
            }
            Err(err) => {
                tracing::warn!(book_id = self.id, error = %err, "failed to load book");
                self.form.fail(err.to_string());
                false
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn form(&self) -> &FormState<BookFields> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState<BookFields> {
        &mut self.form
    }

    /// Send the form as a full replace; on success the next route is the book list.
    pub async fn submit(&mut self, client: &CatalogClient) -> Option<Route> {
        self.form.clear_error();
        match client
            .update_book(self.id, &self.form.values().to_input())
            .await
        {
            Ok(book) => {
                tracing::info!(book_id = book.id, "book updated");
                Some(Route::Books)
            }
            Err(err) => {
                tracing::warn!(book_id = self.id, error = %err, "failed to update book");
                self.form.fail(err.to_string());
                None
            }
        }
    }
}
