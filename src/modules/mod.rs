pub mod books;
pub mod comments;
pub mod posts;
pub mod resource;
pub mod users;

use std::sync::Arc;

use bookshelf_db::RecordStore;
use bookshelf_kernel::ModuleRegistry;

/// Register every resource module, each sharing the same store handle
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn RecordStore>) {
    registry.register(books::create_module(store.clone()));
    registry.register(users::create_module(store.clone()));
    registry.register(comments::create_module(store));
}
