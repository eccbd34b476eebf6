use std::{io, path::Path};

use oxc_resolver::FileSystem as OxcResolverFileSystem;

/// Every disk access of the converter goes through this trait, the resolver's probes included.
pub trait FileSystem: OxcResolverFileSystem + Send + Sync {
  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

  fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  fn is_file(&self, path: &Path) -> bool;
}
