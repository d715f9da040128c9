pub mod paths;

pub use paths::{get_home_dir, short_dir};
