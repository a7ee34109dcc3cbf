// Database entities (sea-orm models)
pub mod note;
pub mod refresh_token;
pub mod user;
