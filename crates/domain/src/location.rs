//! Location: a named physical area that sensors and devices belong to.

use serde::{Deserialize, Serialize};

use crate::error::{TidyHubError, ValidationError};
use crate::id::LocationId;

/// A location as the location directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

impl Location {
    /// Create a builder for constructing a [`Location`].
    #[must_use]
    pub fn builder() -> LocationBuilder {
        LocationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TidyHubError::Validation`] when the id or the name is empty.
    pub fn validate(&self) -> Result<(), TidyHubError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyLocation.into());
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Location`].
#[derive(Debug, Default)]
pub struct LocationBuilder {
    id: Option<LocationId>,
    name: Option<String>,
}

impl LocationBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<LocationId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Consume the builder, validate, and return a [`Location`].
    ///
    /// When no name is given the id doubles as the display name.
    ///
    /// # Errors
    ///
    /// Returns [`TidyHubError::Validation`] if the id is missing or empty.
    pub fn build(self) -> Result<Location, TidyHubError> {
        let id = self.id.unwrap_or_else(|| LocationId::new(""));
        let location = Location {
            name: self.name.unwrap_or_else(|| id.to_string()),
            id,
        };
        location.validate()?;
        Ok(location)
    }
}
