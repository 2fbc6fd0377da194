use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("selection is collapsed at offset {offset}")]
    CollapsedRange { offset: usize },
    #[error("font size {0} is outside the 1-7 scale")]
    FontSizeOutOfScale(u8),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
}
