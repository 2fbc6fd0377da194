mod error;
mod exec;
mod fragment;
mod history;
mod html;
mod inspect;
mod range;
mod style;

pub use crate::error::*;
pub use crate::exec::{ExecCommand, ExecEffect, is_inline_format_tag};
pub use crate::fragment::*;
pub use crate::history::*;
pub use crate::html::{decode_entities, escape_text};
pub use crate::inspect::*;
pub use crate::range::*;
pub use crate::style::*;
