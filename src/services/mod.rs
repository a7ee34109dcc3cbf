// Services layer - crypto and token concerns shared by stores and APIs
pub mod password;
pub mod token_service;

pub use password::PasswordService;
pub use token_service::TokenService;
