mod argon2_hasher;
mod auth_service_impl;
mod credential_verifier_impl;
mod jwt_codec;
mod user_store_impl;
mod validation;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use credential_verifier_impl::*;
pub use jwt_codec::*;
pub use user_store_impl::*;
pub use validation::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
