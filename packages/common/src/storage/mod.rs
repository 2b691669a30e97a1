mod error;
mod kind;
mod path;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use kind::MediaKind;
pub use path::{MediaPath, UPLOADS_PREFIX};
pub use traits::MediaStore;
