//! Messaging between the chat core and its front ends.
//!
//! The session and the reveal engine publish [`ChatEvent`]s on an
//! [`EventBus`]; renderers subscribe and draw them.
//!
//! ```text
//!     ┌──────────────┐   ┌──────────────┐
//!     │ ChatSession  │   │ RevealEngine │
//!     └──────┬───────┘   └──────┬───────┘
//!            │ publish          │
//!            ▼                  ▼
//!          ┌──────────────────────┐
//!          │       EventBus       │
//!          └──────────┬───────────┘
//!                     │ broadcast
//!           ┌─────────┴─────────┐
//!           ▼                   ▼
//!     ┌──────────┐        ┌──────────┐
//!     │ Terminal │        │  Tests / │
//!     │ Renderer │        │  others  │
//!     └──────────┘        └──────────┘
//! ```

mod bus;
mod renderer;
mod types;

pub use bus::{BusError, EventBus, EventReceiver, EventSender};
pub use renderer::{RenderStyle, TerminalRenderer};
pub use types::*;
