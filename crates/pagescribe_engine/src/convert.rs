use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("conversion produced no text")]
    Empty,
    #[error("conversion failed: {0}")]
    Failed(String),
}

/// Primary HTML to readable-text conversion.
pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError> {
        // html2md panics on some malformed tables; treat that as a failed conversion.
        let markdown = panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html(html)))
            .map_err(|_| ConvertError::Failed("html2md panicked".to_string()))?;
        let trimmed = markdown.trim();
        if trimmed.is_empty() {
            return Err(ConvertError::Empty);
        }
        Ok(trimmed.to_string())
    }
}
