pub mod types;
pub mod config;
pub mod text;
pub mod entities;
pub mod media;
pub mod render;
pub mod filter;
pub mod resolver;
pub mod dedup;
pub mod sources;
pub mod pipeline;
pub mod dispatch;

pub use types::*;
pub use config::{Catalog, RelayConfig};
pub use dedup::DedupGuard;
pub use dispatch::{Dispatcher, LogPublisher};
pub use pipeline::FeedPipeline;
pub use render::MarkerRenderer;
pub use resolver::GoogleNewsResolver;
