pub mod auth;
pub mod catalog;
pub mod room;
pub mod storage;

pub use auth::{Claims, PasswordService, RoomClaims, SiteGate, TokenService, TokenType};
pub use catalog::{CatalogService, UploadMeta};
pub use room::{RoomAccess, RoomService};
pub use storage::MediaStorage;
