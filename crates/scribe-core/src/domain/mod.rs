//! Domain entities - posts, comments, authors and attachments.

mod author;
mod comment;
mod media;
mod post;

pub use author::{AuthorLookup, AuthorProfile, LOADING_PLACEHOLDER, UNKNOWN_PLACEHOLDER};
pub use comment::{ANONYMOUS, Comment, Commenter, NewComment};
pub use media::{ObjectUpload, ObjectUrls, StoredObject};
pub use post::{
    MAX_SLUG_LEN, NewPost, Post, PostFilter, PostPatch, PostStatus, sort_by_recency,
    validate_object_id, validate_slug, validate_user_id,
};
