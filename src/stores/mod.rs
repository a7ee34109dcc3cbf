// Stores layer - Data access and repository pattern
pub mod note_store;
pub mod token_store;
pub mod user_store;

pub use note_store::NoteStore;
pub use token_store::TokenStore;
pub use user_store::UserStore;
