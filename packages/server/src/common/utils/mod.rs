pub mod content;
pub mod slug;

pub use content::*;
pub use slug::*;
