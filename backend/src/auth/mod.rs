mod session;

pub use session::{AuthError, AuthUser, SessionKeys};
