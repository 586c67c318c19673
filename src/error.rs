use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovgapsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cannot merge line {line}: conflicting branch flags")]
    BranchFlagConflict { line: u32 },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("No files matched the pattern: {0}")]
    NoMatches(String),

    #[error("Invalid glob pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, CovgapsError>;
