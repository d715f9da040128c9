pub mod activity;
pub mod agents;
pub mod sessions;
pub mod terminal;
