//! Domain entities - the core business objects.

mod comment;

mod content;

pub use comment::Comment;
pub use content::{Content, MAX_SLUG_LEN, validate_slug};
