/// Kinds of engine event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event {
    ToggleDebug,
    WindowResized,
    Created,
    Destroyed,
    Selected,
    Deselected,
    ParentChanged,
    TransformChanged,
    VisibilityChanged,
    Collision,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    /// Window size in physical pixels.
    Size { width: u32, height: u32 },
    Flag(bool),
    /// Opaque id of the object the event refers to.
    Entity(u64),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Message {
    pub event: Event,
    pub payload: Payload,
}

impl Message {
    pub const fn new(event: Event) -> Self {
        Self {
            event,
            payload: Payload::None,
        }
    }

    pub const fn with_payload(event: Event, payload: Payload) -> Self {
        Self { event, payload }
    }

    pub const fn resized(width: u32, height: u32) -> Self {
        Self::with_payload(Event::WindowResized, Payload::Size { width, height })
    }
}
