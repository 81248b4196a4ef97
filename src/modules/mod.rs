pub mod books;

use std::sync::Arc;

use catalog_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register all catalog modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, books: Arc<dyn BookStore>) {
    registry.register_custom(books::create_module(books));
}
