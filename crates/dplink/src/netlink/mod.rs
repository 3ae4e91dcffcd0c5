//! Netlink plumbing: framing, attributes, the async socket and generic
//! netlink families.

pub mod attr;
pub mod builder;
pub mod error;
pub mod genl;
pub mod message;
pub mod socket;
pub mod stream;

pub use builder::{AttrBuilder, MessageBuilder, NestToken};
pub use error::{Error, Result};
pub use socket::NetlinkSocket;
pub use stream::GenlEvents;
