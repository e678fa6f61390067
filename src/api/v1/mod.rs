mod cookie;
mod error;
mod handler;
mod router;

pub use cookie::RefreshCookie;
pub use error::{ApiErrorCode, recover_error};
pub use router::routes;
