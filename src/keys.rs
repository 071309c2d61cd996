use crate::{Error, Result};

const SEPARATOR: char = '.';

/// Maps logical keys to the connection's namespace and back: `prefix + "." + key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyNamer {
    prefix: String,
}

impl KeyNamer {
    /// The prefix is validated when the connection is opened; an empty prefix is rejected there.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::InvalidArgument("key prefix must not be empty".to_string()));
        }
        Ok(KeyNamer { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn qualify_one(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("key is empty".to_string()));
        }
        Ok(format!("{}{}{}", self.prefix, SEPARATOR, key))
    }

    pub fn qualify<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Err(Error::InvalidArgument("keys is empty".to_string()));
        }
        keys.iter().map(|key| self.qualify_one(key.as_ref())).collect()
    }

    pub fn unqualify_one<'a>(&self, key: &'a str) -> Result<&'a str> {
        key.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "key {key:?} is not under prefix {:?}",
                    self.prefix
                ))
            })
    }

    pub fn unqualify<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Err(Error::InvalidArgument("keys is empty".to_string()));
        }
        keys.iter()
            .map(|key| self.unqualify_one(key.as_ref()).map(str::to_string))
            .collect()
    }
}
