use serde::{Deserialize, Deserializer, Serialize};

/// Longest title accepted, matching the `VARCHAR(255)` column.
pub const MAX_TITLE_LEN: usize = 255;
/// Matches the `VARCHAR(2048)` description column.
pub const MAX_DESCRIPTION_LEN: usize = 2048;
/// Matches the `VARCHAR(1024)` cover column.
pub const MAX_COVER_LEN: usize = 1024;

/// A persisted book row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Server-assigned identifier
    pub id: u64,
    /// Title of the book
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Cover image URL or identifier
    pub cover: Option<String>,
    /// Price, if known
    pub price: Option<f64>,
}

/// Request body for create and update.
///
/// Every field is optional at the wire level so a missing title is reported
/// as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
}

/// Validated column values for an insert or a full replace.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub price: Option<f64>,
}

impl NewBook {
    pub fn into_book(self, id: u64) -> Book {
        Book {
            id,
            title: self.title,
            description: self.description,
            cover: self.cover,
            price: self.price,
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

/// Response body for a successful create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Created {
    pub message: String,
    pub book: Book,
}

impl BookInput {
    /// Check the input and normalize it into column values.
    ///
    /// Blank optional text becomes `None`; the title is trimmed.
    pub fn validate(self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        if title.is_empty() {
            errors.push(FieldError {
                field: "title",
                error: "required",
            });
        } else if title.chars().count() > MAX_TITLE_LEN {
            errors.push(FieldError {
                field: "title",
                error: "too_long",
            });
        }

        let description = non_blank(self.description);
        if exceeds(&description, MAX_DESCRIPTION_LEN) {
            errors.push(FieldError {
                field: "description",
                error: "too_long",
            });
        }

        let cover = non_blank(self.cover);
        if exceeds(&cover, MAX_COVER_LEN) {
            errors.push(FieldError {
                field: "cover",
                error: "too_long",
            });
        }

        if let Some(price) = self.price {
            if !price.is_finite() {
                errors.push(FieldError {
                    field: "price",
                    error: "must_be_finite",
                });
            } else if price < 0.0 {
                errors.push(FieldError {
                    field: "price",
                    error: "must_be_non_negative",
                });
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewBook {
            title,
            description,
            cover,
            price: self.price,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Column widths count characters, not bytes.
fn exceeds(value: &Option<String>, max: usize) -> bool {
    value.as_ref().is_some_and(|v| v.chars().count() > max)
}

/// Accept a number, a numeric string, an empty string or null.
///
/// Browser number inputs post their value as a string.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    match Option::<RawPrice>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPrice::Number(n)) => Ok(Some(n)),
        Some(RawPrice::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawPrice::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("price '{s}' is not a number"))),
    }
}
