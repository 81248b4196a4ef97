//! Form state shared by the add and update views.

use catalog_app::books::models::{Book, BookInput};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

/// A fixed set of named text inputs.
pub trait FieldSet: Clone + Default {
    /// Field names in display order.
    const FIELDS: &'static [&'static str];

    /// Return a copy with `name` set to `value`, leaving other fields as they are.
    fn with_field(self, name: &str, value: &str) -> Result<Self, FormError>;
}

/// Values of one form plus the last error to show next to it.
#[derive(Debug, Clone, Default)]
pub struct FormState<F> {
    values: F,
    error: Option<String>,
}

impl<F: FieldSet> FormState<F> {
    pub fn new() -> Self {
        Self {
            values: F::default(),
            error: None,
        }
    }

    pub fn with_values(values: F) -> Self {
        Self {
            values,
            error: None,
        }
    }

    /// Merge one edited input into the current values.
    ///
    /// A rejected edit leaves the values untouched.
    pub fn change(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        self.values = self.values.clone().with_field(name, value)?;
        Ok(())
    }

    pub fn values(&self) -> &F {
        &self.values
    }

    /// Record a failure for display.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// The inputs of the add and update book forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFields {
    pub title: String,
    pub description: String,
    pub cover: String,
    pub price: Option<f64>,
}

impl BookFields {
    /// Prefill from a stored book.
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            description: book.description.clone().unwrap_or_default(),
            cover: book.cover.clone().unwrap_or_default(),
            price: book.price,
        }
    }

    /// Request body carrying every field.
    pub fn to_input(&self) -> BookInput {
        BookInput {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            cover: Some(self.cover.clone()),
            price: self.price,
        }
    }
}

impl FieldSet for BookFields {
    const FIELDS: &'static [&'static str] = &["title", "description", "cover", "price"];

    fn with_field(self, name: &str, value: &str) -> Result<Self, FormError> {
        match name {
            "title" => Ok(Self {
                title: value.to_string(),
                ..self
            }),
            "description" => Ok(Self {
                description: value.to_string(),
                ..self
            }),
            "cover" => Ok(Self {
                cover: value.to_string(),
                ..self
            }),
            "price" => {
                let trimmed = value.trim();
                let price = if trimmed.is_empty() {
                    None
                } else {
                    let parsed = trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|p| p.is_finite())
                        .ok_or_else(|| FormError::InvalidNumber {
                            field: "price",
                            value: value.to_string(),
                        })?;
                    Some(parsed)
                };
                Ok(Self { price, ..self })
            }
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}
