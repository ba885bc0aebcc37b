//! Lazily populated GPU resource caches.
//!
//! Entries are created on first lookup, shared through `Rc`, and dropped by
//! `free`/`free_all` or with the cache itself. A lookup after `free` builds a
//! fresh resource.

mod cache;
mod error;
mod shader;
mod texture;

pub use cache::ResourceCache;
pub use error::CacheError;
pub use shader::{program_key, ProgramId, ShaderCache, ShaderProgram};
pub use texture::{fnv1a, Texture, TextureCache, TextureFormat, TextureId, TextureProfile};
