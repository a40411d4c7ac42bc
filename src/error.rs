use thiserror::Error;

use crate::ast::Segment;

/// Every failure is fatal to the whole translation.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A source line that is not a recognized VM command.
    #[error("{unit}:{line}: invalid command `{text}`")]
    Parse {
        unit: String,
        line: usize,
        text: String,
    },
    #[error("cannot pop into the constant segment")]
    IllegalPop,
    #[error("index {index} is out of range for segment {segment}")]
    IndexOutOfRange { segment: Segment, index: u16 },
    /// Two label declarations resolved to the same assembly symbol.
    #[error("label `{0}` declared twice")]
    DuplicateLabel(String),
    #[error("while translating `{command}`: {source}")]
    Command {
        command: String,
        #[source]
        source: Box<TranslateError>,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    pub(crate) fn in_command(self, command: impl ToString) -> Self {
        TranslateError::Command {
            command: command.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
