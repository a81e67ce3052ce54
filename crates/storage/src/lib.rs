pub mod error;
mod landing;
mod listing;
mod locks;
mod path;
pub mod transfer;

pub use crate::landing::{candidates, count_drawings, normalize_extensions};
pub use crate::listing::{Listing, ListingCache};
pub use crate::locks::DocumentLocks;
pub use crate::path::normalize_key;
pub use crate::transfer::{BulkCopy, BulkCopySettings, Method, Mode, Transfer, Transferred};
