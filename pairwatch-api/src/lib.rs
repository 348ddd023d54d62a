// PairWatch API Library
//
// HTTP routes and the realtime sync relay endpoint

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
