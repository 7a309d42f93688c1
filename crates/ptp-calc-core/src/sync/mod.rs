//! Cross-Frame Synchronization
//!
//! Message protocol between calculator widgets and the page embedding them.
//! An "original" widget publishes each result; the host relays it as a
//! baseline to the sibling "new" widget carrying the same `pageId`. Every
//! inbound message is checked against a fixed origin allowlist, and nothing
//! is sent unless the embedding page's origin is on it.

mod bridge;
mod error;
pub mod message;
pub mod origin;
pub mod resize;

pub use bridge::{dispatch_all, ChannelSink, FrameBridge, FrameSink, InboundEvent, OutboundMessage};
pub use error::{ProtocolRejected, RejectReason};
pub use message::{relay_as_baseline, FrameMessage, Language};
pub use origin::OriginAllowlist;
pub use resize::{run_resize_reporter, HeightReporter, RESIZE_POLL_INTERVAL};
