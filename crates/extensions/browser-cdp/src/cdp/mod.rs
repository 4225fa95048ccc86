//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to Chrome/Chromium over the browser WebSocket and speaks the CDP
//! JSON-RPC protocol: commands are matched to responses by id, events are
//! routed to the [`PageSession`] they belong to.
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://127.0.0.1:9222").await?;
//! let target = client.create_target("about:blank", true).await?;
//! let page = client.attach(&target).await?;
//! page.navigate("https://example.com").await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::{COMMAND_TIMEOUT, CdpClient};
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
