pub mod entity;
pub mod keystrokes;
pub mod persistence;
pub mod registry;

pub use entity::{
    ClosedSessionEntry, ResumeHint, SavedSession, SavedTab, Session, SessionInfo, TitleInfo,
};
pub use persistence::SessionStore;
pub use registry::SessionRegistry;
