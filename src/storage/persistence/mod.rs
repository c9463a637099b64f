//! History store implementations.

mod filesystem;
mod memory;

pub use filesystem::{DEFAULT_HISTORY_FILE, FilesystemStore, MAX_FILE_SIZE};
pub use memory::MemoryStore;
