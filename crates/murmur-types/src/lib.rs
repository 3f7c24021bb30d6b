pub mod api;
pub mod models;
pub mod timestamp;

/// Upper bound, in characters, for thought text and reaction bodies.
pub const MAX_TEXT_LEN: usize = 280;
