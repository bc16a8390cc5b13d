//! Data model shared by the wizard, the workspace and the backend client.
//!
//! Field names follow the backend's wire format (`nombre`, `tipo`, ...)
//! through serde renames; the Rust side uses English names throughout.

mod attachment;
mod identity;
mod ticket;

pub use attachment::AttachmentCandidate;
pub use identity::{Identity, IdentityId, NewIdentity};
pub use ticket::{
    AttachmentRef, IdentitySummary, PriorityLevel, Ticket, TicketId, TicketType,
};
