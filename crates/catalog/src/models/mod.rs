mod entry;
mod update;

pub use self::entry::CatalogEntry;
pub use self::update::{Sequence, UpdateEntry};
