pub mod message;
pub mod payload;
pub mod repository;

pub use message::*;
pub use payload::*;
pub use repository::*;
