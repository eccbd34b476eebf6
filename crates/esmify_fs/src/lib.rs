mod file_system;
#[cfg(feature = "os")]
mod os;

pub use oxc_resolver::FileSystem as OxcResolverFileSystem;

pub use crate::file_system::FileSystem;
#[cfg(feature = "os")]
pub use os::OsFileSystem;
