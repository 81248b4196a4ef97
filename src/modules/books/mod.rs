pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{InitCtx, Module, SchemaStatement};
use serde_json::json;

use store::BookStore;

/// Books module: the catalog's single resource.
pub struct BooksModule {
    store: Arc<dyn BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64", "minimum": 1 }
        }]);
        let book_input_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookInput" }
                }
            }
        });
        let book_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Book" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books ordered by id",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "503": error_response("Database unavailable"),
                            "500": error_response("Database error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_input_body.clone(),
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Created" }
                                    }
                                }
                            },
                            "400": error_response("Malformed body"),
                            "422": error_response("Validation error"),
                            "503": error_response("Database unavailable"),
                            "500": error_response("Database error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": book_response("The book"),
                            "404": error_response("No book with this id"),
                            "503": error_response("Database unavailable")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "requestBody": book_input_body,
                        "responses": {
                            "200": book_response("The updated book"),
                            "404": error_response("No book with this id"),
                            "422": error_response("Validation error"),
                            "503": error_response("Database unavailable")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "description": { "type": ["string", "null"] },
                            "cover": { "type": ["string", "null"] },
                            "price": { "type": ["number", "null"] }
                        },
                        "required": ["id", "title"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": models::MAX_TITLE_LEN },
                            "description": {
                                "type": ["string", "null"],
                                "maxLength": models::MAX_DESCRIPTION_LEN
                            },
                            "cover": {
                                "type": ["string", "null"],
                                "maxLength": models::MAX_COVER_LEN
                            },
                            "price": {
                                "description": "Number, numeric string, empty string or null",
                                "type": ["number", "string", "null"]
                            }
                        },
                        "required": ["title"]
                    },
                    "Created": {
                        "type": "object",
                        "properties": {
                            "message": { "type": "string" },
                            "book": { "$ref": "#/components/schemas/Book" }
                        },
                        "required": ["message", "book"]
                    }
                }
            }
        }))
    }

    fn schema(&self) -> Vec<SchemaStatement> {
        vec![SchemaStatement {
            id: "001_books",
            ddl: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id            BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    title         VARCHAR(255)    NOT NULL,
                    `description` VARCHAR(2048)   NULL,
                    cover         VARCHAR(1024)   NULL,
                    price         DOUBLE          NULL
                )
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module backed by `store`
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
