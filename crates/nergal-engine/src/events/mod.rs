//! Synchronous publish/subscribe messaging.
//!
//! A [`Messenger`] is owned by the runtime and passed by reference to whoever
//! needs to subscribe or trigger. Delivery happens inline inside `trigger`.

mod message;
mod messenger;

pub use message::{Event, Message, Payload};
pub use messenger::{Callback, Messenger, RecipientId};
