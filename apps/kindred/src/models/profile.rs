use serde::{Deserialize, Serialize};

use crate::models::opportunity::{Availability, Category};

/// The volunteer being matched. Read-only for the lifetime of a match request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub interests: Vec<Category>,
    pub availability: Vec<Availability>,
    pub skills: Vec<String>,
    pub bio: String,
}
