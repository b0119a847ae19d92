pub mod event;
pub mod kind;
pub mod validate;

pub use event::{LoggedEvent, Meta, MetaValue, TrackEvent};
pub use kind::{EventKind, PageCategory, UnknownKind};
pub use validate::{is_valid_path, validate_payload, ValidationError, MAX_PATH_LEN};
