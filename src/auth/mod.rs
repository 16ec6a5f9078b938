//! OAuth device-code flow and token storage.

pub mod device_code;
pub mod error;
pub mod flow;
pub mod store;
pub mod token;

pub use device_code::{DeviceLoginContext, DeviceLoginPrompt, PollResult};
pub use error::AuthError;
pub use flow::DeviceCodeAuth;
pub use store::{FileTokenStore, TokenStore};
pub use token::TokenBundle;
