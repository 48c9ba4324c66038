//! # AgriHealth Types
//!
//! Validated primitives shared by every crate in the workspace.
//!
//! - [`NonEmptyText`] guarantees at least one non-whitespace character.
//! - [`SoilType`] is the closed set of soil textures a report can be requested for.

use std::fmt;
use std::str::FromStr;

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
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Converts optional free text into `Option<NonEmptyText>`, treating blank input as absent.
    pub fn optional(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

/// Errors raised when parsing a [`SoilType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SoilTypeError {
    #[error("unknown soil type: {0}")]
    Unknown(String),
}

/// Dominant soil texture.
///
/// Closed set: report requests naming anything else are rejected before any generator or store
/// is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Clay,
    Sandy,
    Loam,
    Silt,
    Peaty,
    Chalky,
}

impl SoilType {
    /// Every soil type, in the order they are offered for selection.
    pub const ALL: [SoilType; 6] = [
        SoilType::Clay,
        SoilType::Sandy,
        SoilType::Loam,
        SoilType::Silt,
        SoilType::Peaty,
        SoilType::Chalky,
    ];

    /// Lowercase wire identifier, as stored in the `soil_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "clay",
            SoilType::Sandy => "sandy",
            SoilType::Loam => "loam",
            SoilType::Silt => "silt",
            SoilType::Peaty => "peaty",
            SoilType::Chalky => "chalky",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            SoilType::Clay => "Clay Soil",
            SoilType::Sandy => "Sandy Soil",
            SoilType::Loam => "Loam Soil",
            SoilType::Silt => "Silty Soil",
            SoilType::Peaty => "Peaty Soil",
            SoilType::Chalky => "Chalky Soil",
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoilType {
    type Err = SoilTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        SoilType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| SoilTypeError::Unknown(needle.to_string()))
    }
}
