//! Dialog definitions for each OS family.
//!
//! A dialog is data: an ordered list of steps keyed by OS family and
//! [`Phase`], interpreted by the [`Sequencer`](crate::sequencer::Sequencer).
//! Built-in dialogs live in [`vendors`] and are looked up through the
//! [`DialogRegistry`].

mod definition;
mod registry;
mod stage;
mod template;
pub mod vendors;

pub use definition::{Action, Condition, DialogDefinition, Exchange, Step};
pub use registry::DialogRegistry;
pub use stage::{Phase, Stage, TransportKind};
pub use template::{Scope, Template};
