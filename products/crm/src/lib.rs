//! CRM page controllers.
//!
//! Each page keeps the local state a screen needs (current page of records,
//! filters, loading and error flags, pending delete confirmation, toasts) and
//! delegates every read and write to the backend through the traits in
//! [`source`]. Nothing here renders; callers decide how to present state.

pub mod confirm;
pub mod csv_io;
pub mod form;
pub mod kanban;
pub mod list;
pub mod pages;
pub mod pagination;
pub mod search;
pub mod source;
pub mod stats;
pub mod template;
#[cfg(test)]
mod testing;
pub mod toast;

pub use confirm::DeleteConfirm;
pub use form::{FieldErrors, SubmitError, Validate, submit};
pub use kanban::{Column, KanbanBoard};
pub use list::{ListPage, load_options};
pub use pagination::{PageItem, Pager, page_window};
pub use search::Debouncer;
pub use source::{KanbanSource, ListSource, RecordSink};
pub use toast::{Level, Notice, Toasts};
