//! User profile type definitions

use serde::{Deserialize, Serialize};

/// An image and its alternate renditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub width: u64,
    pub height: u64,
    /// Location of the image
    pub path: String,
    /// Other sizes of the same image
    #[serde(default)]
    pub child_images: Vec<ImageDescriptor>,
}

impl ImageDescriptor {
    pub fn new(width: u64, height: u64, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            path: path.into(),
            child_images: Vec::new(),
        }
    }
}

/// The authenticated user. Its presence in the secure store means logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable account identifier, also scopes watch progress
    pub id: String,
    pub username: String,
    pub profile_image: ImageDescriptor,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, username: impl Into<String>, profile_image: ImageDescriptor) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            profile_image,
        }
    }
}
