mod gate;
pub mod password;

pub use gate::{removal_cookie, require_session, session_cookie, CurrentUser};
pub use password::{hash_password, verify_missing_account, verify_password, PasswordError};
