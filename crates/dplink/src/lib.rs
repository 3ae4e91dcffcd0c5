//! Async generic netlink client for Linux DPLL devices.
//!
//! The kernel's `dpll` family exposes clock-synchronization devices (DPLLs)
//! and the pins feeding them. This crate speaks that family: it compiles
//! command-line style tokens into TLV requests, decodes replies and
//! notifications through static attribute tables, and renders decoded
//! records as text or JSON.
//!
//! # Features
//!
//! - `output` - text/JSON rendering of decoded records (default)
//!
//! # Example
//!
//! ```ignore
//! use dplink::netlink::genl::dpll::{DpllConnection, Object, Verb, compile, decode};
//! use dplink::output::{OutputFormat, OutputOptions, Printable, render::{DEVICE_SCRIPT, render}};
//!
//! #[tokio::main]
//! async fn main() -> dplink::Result<()> {
//!     let conn = DpllConnection::new().await?;
//!     let request = compile::<&str>(Object::Device, Verb::Show, &[])?;
//!
//!     let mut out = std::io::stdout();
//!     for reply in conn.execute(&request).await? {
//!         let record = decode(Object::Device.table(), &reply.attrs)?;
//!         let view = render(&record, &DEVICE_SCRIPT)?;
//!         view.print(&mut out, OutputFormat::Text, &OutputOptions::default())?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod netlink;
pub mod util;

#[cfg(feature = "output")]
pub mod output;

pub use netlink::{Error, Result};
