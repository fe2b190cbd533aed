//! Resource services
//!
//! One service per collection. Services own the lookup-then-act logic
//! (existence checks, parent scoping, identifier resolution, pagination)
//! on top of an [`EntityStore`](crate::repository::EntityStore) and speak
//! in [`ApiError`](crate::handlers::ApiError), so handlers stay thin.

mod books;
mod shelves;

pub use books::BookService;
pub use shelves::ShelfService;
