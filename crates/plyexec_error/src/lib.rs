use std::error::Error;
use std::fmt;

/// Error type shared by all plyexec crates.
#[derive(Debug)]
pub struct PlyexecError {
    /// Message for the error.
    msg: String,

    /// Source of the error, if any.
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl PlyexecError {
    pub fn new(msg: impl Into<String>) -> Self {
        PlyexecError {
            msg: msg.into(),
            source: None,
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        PlyexecError {
            msg: msg.into(),
            source: Some(source),
        }
    }
}

impl fmt::Display for PlyexecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)?;
        if let Some(source) = &self.source {
            write!(f, "\nError source: {source}")?;
        }
        Ok(())
    }
}

impl Error for PlyexecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for PlyexecError {
    fn from(value: fmt::Error) -> Self {
        PlyexecError::with_source("Format error", Box::new(value))
    }
}

pub type Result<T, E = PlyexecError> = std::result::Result<T, E>;

/// An extension trait for adding context to the Error variant of a result.
pub trait ResultExt<T, E> {
    /// Wrap an error with a static context string.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap an error with a context string generated from a function.
    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(PlyexecError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F: Fn() -> String>(self, f: F) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(PlyexecError::with_source(f(), Box::new(e))),
        }
    }
}

/// An extension trait for converting the None variant of an option into an
/// error.
pub trait OptionExt<T> {
    /// Return an error with the given message if the option is None.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(PlyexecError::new(msg)),
        }
    }
}

/// Return an error indicating some functionality is not implemented.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        return Err($crate::PlyexecError::new(format!("Not implemented: {msg}")));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_source() {
        let res: std::result::Result<(), _> = "nope".parse::<i64>().map(|_| ());
        let err = res.context("parsing count").unwrap_err();
        assert!(err.to_string().starts_with("parsing count"));
        assert!(err.source().is_some());
    }

    #[test]
    fn required_on_none() {
        let opt: Option<i64> = None;
        let err = opt.required("missing value").unwrap_err();
        assert_eq!("missing value", err.to_string());
    }
}
