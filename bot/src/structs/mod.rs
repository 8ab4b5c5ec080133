pub mod message;
pub mod reply;

pub use message::LinkMessage;
pub use reply::Reply;
