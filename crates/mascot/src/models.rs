pub mod event;
pub mod message;
pub mod persona;

pub use event::StreamEvent;
pub use message::{ChatTurn, ImageAttachment, Role};
pub use persona::{Persona, Skill};
