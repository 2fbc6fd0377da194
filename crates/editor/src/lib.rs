mod autosave;
mod backend;
mod command;
mod config;
mod error;
mod field;
mod geometry;
mod selection;
mod session;
mod store;
mod time;
mod toolbar;

pub use crate::autosave::*;
pub use crate::backend::*;
pub use crate::command::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::field::*;
pub use crate::geometry::*;
pub use crate::selection::*;
pub use crate::session::*;
pub use crate::store::*;
pub use crate::time::*;
pub use crate::toolbar::*;

pub use folio_markup as markup;
