//! Services - the logic between UI views and the ports.

mod author;
mod comments;
mod content;
mod listing;
mod media;

#[cfg(test)]
pub(crate) mod testing;

pub use author::{AuthorResolver, DEFAULT_AUTHOR_TTL, decode_execution};
pub use comments::{CommentService, CommentThread};
pub use content::{AttachmentCleanup, ContentService, DeleteOutcome};
pub use listing::{
    CachedListing, DEFAULT_LISTING_KEY, DEFAULT_LISTING_TTL, ListingCache, SlotState,
};
pub use media::MediaLibrary;
