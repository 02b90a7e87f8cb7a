//! Per-kind item transformations. Each module turns already-parsed feed
//! items into outgoing payloads; network work (link resolution) stays in
//! [`crate::pipeline::FeedPipeline`].

pub mod generic;
pub mod microblog;
pub mod news;
pub mod short_video;

pub use short_video::strip_trailing_tags;
pub use news::mark_hashtag;
