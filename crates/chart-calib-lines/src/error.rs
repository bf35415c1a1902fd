/// Errors raised by the line detection crate.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LinesError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParams {
        name: &'static str,
        reason: &'static str,
    },
}

impl LinesError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        LinesError::InvalidParams { name, reason }
    }
}
