//! Validated primitive types shared by the Ward crates.
//!
//! - [`NonEmptyText`]: trimmed text that is guaranteed not to be blank.
//! - [`RecordId`]: a server-assigned record identifier, accepted either as a plain JSON string or
//!   as an extended-JSON object (`{"$oid": "..."}`) and always normalised to the plain form.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors returned when an identifier cannot be accepted.
#[derive(Debug, thiserror::Error)]
pub enum RecordIdError {
    #[error("record identifier cannot be empty")]
    Empty,
    #[error("record identifier contains invalid characters: '{0}'")]
    InvalidCharacters(String),
}

/// Identifier assigned by the remote record service.
///
/// Identifiers are opaque to the client. They are embedded as URL path segments, so whitespace
/// and `/` are rejected; everything else is passed through untouched.
///
/// # Wire forms
/// Both of these decode to the identifier `"X"`:
/// ```json
/// "X"
/// {"$oid": "X"}
/// ```
/// Serialisation always produces the plain string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Validates and wraps an identifier string.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, RecordIdError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(RecordIdError::Empty);
        }
        if input.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(RecordIdError::InvalidCharacters(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Accepted wire representations of a [`RecordId`].
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RecordIdRepr {
    Plain(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = match RecordIdRepr::deserialize(deserializer)? {
            RecordIdRepr::Plain(s) => s,
            RecordIdRepr::Extended { oid } => oid,
        };
        RecordId::parse(raw).map_err(serde::de::Error::custom)
    }
}
