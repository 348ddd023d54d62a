pub mod jwt;
pub mod password;
pub mod site;

pub use jwt::{Claims, RoomClaims, TokenService, TokenType};
pub use password::PasswordService;
pub use site::SiteGate;
