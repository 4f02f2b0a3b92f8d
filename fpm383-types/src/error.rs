pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {what} needs {expected} bytes, got {actual}")]
    TooShort {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Fail unless `data` holds at least `expected` bytes
pub(crate) fn require(what: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(Error::TooShort {
            what,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}
