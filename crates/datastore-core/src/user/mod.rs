//! Logged-in user record and the stores scoped to it

mod store;
mod types;

pub use store::{CredentialStore, UserStore, USER_STORE_KEY};
pub use types::{ImageDescriptor, UserProfile};
