// Public API - what other modules can use
pub use feed::{HttpPatchFeed, PatchFeed, StaticPatchFeed};
pub use models::{PatchInfo, PatchManifest};

// Internal modules
mod feed;
mod models;
