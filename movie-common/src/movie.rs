//! Movie entity
//!
//! A `Movie` owns its validation. Setters never validate; callers run
//! [`Movie::is_valid`] before handing the value to a store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::time;
use crate::user::User;

#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// Internal identity, fixed at construction
    pub id: Uuid,
    /// Externally addressable identifier
    pub external_id: String,
    pub title: String,
    pub rated: String,
    /// `None` until a release date has been set
    pub released: Option<DateTime<Utc>>,
    /// Minutes
    pub run_time: i32,
    pub director: String,
    pub writer: String,
    pub create_user: User,
    pub create_time: DateTime<Utc>,
    pub update_user: User,
    pub update_time: DateTime<Utc>,
}

impl Movie {
    /// Create a movie with identity and audit fields populated
    ///
    /// A nil `id` and an empty `external_id` both report parameter `"ID"`.
    pub fn new(id: Uuid, external_id: &str, create_user: User) -> Result<Self> {
        if id.is_nil() {
            return Err(Error::missing_field("ID", "ID"));
        }
        if external_id.is_empty() {
            return Err(Error::missing_field("ID", "ID"));
        }
        if !create_user.is_valid() {
            return Err(Error::validation("User", "User is invalid"));
        }

        let now = time::now();
        Ok(Self {
            id,
            external_id: external_id.to_string(),
            title: String::new(),
            rated: String::new(),
            released: None,
            run_time: 0,
            director: String::new(),
            writer: String::new(),
            update_user: create_user.clone(),
            create_user,
            create_time: now,
            update_time: now,
        })
    }

    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut Self {
        self.external_id = external_id.into();
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_rated(&mut self, rated: impl Into<String>) -> &mut Self {
        self.rated = rated.into();
        self
    }

    /// Parse an RFC 3339 release date
    pub fn set_released(&mut self, released: &str) -> Result<&mut Self> {
        let parsed = time::parse_rfc3339(released).map_err(|e| Error::Validation {
            param: "release_date".to_string(),
            code: Some("invalid_date_format".to_string()),
            message: e.to_string(),
            source: Some(e),
        })?;
        self.released = Some(parsed);
        Ok(self)
    }

    pub fn set_run_time(&mut self, run_time: i32) -> &mut Self {
        self.run_time = run_time;
        self
    }

    pub fn set_director(&mut self, director: impl Into<String>) -> &mut Self {
        self.director = director.into();
        self
    }

    pub fn set_writer(&mut self, writer: impl Into<String>) -> &mut Self {
        self.writer = writer.into();
        self
    }

    pub fn set_update_user(&mut self, user: User) -> &mut Self {
        self.update_user = user;
        self
    }

    /// Stamp `update_time` with the current UTC instant
    pub fn set_update_time(&mut self) -> &mut Self {
        self.update_time = time::now();
        self
    }

    /// Check that the movie is ready to persist
    ///
    /// Fields are checked in a fixed order and the first failure is returned.
    pub fn is_valid(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::missing_field("title", "title"));
        }
        if self.rated.is_empty() {
            return Err(Error::missing_field("rated", "Rated"));
        }
        if self.released.is_none() {
            return Err(Error::validation("release_date", "Released must have a value"));
        }
        if self.run_time <= 0 {
            return Err(Error::validation(
                "run_time",
                "Run time must be greater than zero",
            ));
        }
        if self.director.is_empty() {
            return Err(Error::missing_field("director", "Director"));
        }
        if self.writer.is_empty() {
            return Err(Error::missing_field("writer", "Writer"));
        }
        if self.external_id.is_empty() {
            return Err(Error::missing_field("extlID", "extlID"));
        }
        Ok(())
    }
}
