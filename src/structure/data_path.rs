//! `DataPath`: a name-sequence address resolving to a data object.
//!
//! Paths are resolved top-down from the structure's top-level objects, one
//! segment per level. The string form joins segments with [`DataPath::SEPARATOR`].

use std::fmt;
use std::str::FromStr;

use crate::structure_error::StructureError;

/// Ordered sequence of object names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// Separator used by the string form.
    pub const SEPARATOR: char = '/';

    /// Builds a path from name segments.
    ///
    /// Fails if any segment is empty or contains the separator.
    pub fn new<I, S>(segments: I) -> Result<Self, StructureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for s in &segments {
            validate_name(s)?;
        }
        Ok(Self { segments })
    }

    /// The empty path (resolves to nothing; parent of top-level objects).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses the separator-joined string form. Leading/trailing separators are ignored.
    pub fn from_string(s: &str) -> Result<Self, StructureError> {
        let trimmed = s.trim_matches(Self::SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::new(trimmed.split(Self::SEPARATOR))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, if any.
    pub fn target_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path without its last segment. The parent of a one-segment path is the root.
    pub fn parent(&self) -> Option<DataPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(DataPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Appends `name` as a new last segment.
    pub fn create_child_path(&self, name: &str) -> Result<DataPath, StructureError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(DataPath { segments })
    }

    /// Returns a copy with the last segment replaced by `name`.
    pub fn with_target_name(&self, name: &str) -> Result<DataPath, StructureError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => *last = name.to_string(),
            None => segments.push(name.to_string()),
        }
        Ok(DataPath { segments })
    }

    /// True if `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &DataPath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

/// Checks that `name` is usable as an object name.
pub fn validate_name(name: &str) -> Result<(), StructureError> {
    if name.is_empty() || name.contains(DataPath::SEPARATOR) {
        return Err(StructureError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", Self::SEPARATOR)?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

impl FromStr for DataPath {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataPath::from_string(s)
    }
}
