// Authentication module
// Session state, persistence, and token refresh

mod refresh;
mod store;
mod types;

pub use refresh::refresh_access_token;
pub use store::SessionStore;
pub use types::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, Session,
    UserProfile,
};
