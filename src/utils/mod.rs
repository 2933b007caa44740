pub mod content_guard;
pub mod encoding;
pub mod path;
pub mod pdf;
