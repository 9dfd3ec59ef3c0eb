pub mod cache;
pub mod handle;

pub use cache::ResourceCache;
pub use handle::Handle;
