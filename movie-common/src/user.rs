//! Authenticated principal

use serde::{Deserialize, Serialize};

/// A user as produced by access-token conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub full_name: String,
    pub hosted_domain: String,
    pub picture_url: String,
    pub profile_link: String,
}

impl User {
    /// Email and all three name fields must be present
    pub fn is_valid(&self) -> bool {
        !self.email.is_empty()
            && !self.last_name.is_empty()
            && !self.first_name.is_empty()
            && !self.full_name.is_empty()
    }
}
