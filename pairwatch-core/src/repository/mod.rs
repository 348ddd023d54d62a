pub mod room;
pub mod session;
pub mod video;

pub use room::RoomRepository;
pub use session::SessionRepository;
pub use video::VideoRepository;
