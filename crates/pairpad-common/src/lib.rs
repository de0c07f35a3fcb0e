pub mod id;
pub mod language;
pub mod protocol;

pub use id::new_session_id;
pub use language::Language;
pub use protocol::{ClientEvent, ServerEvent};
