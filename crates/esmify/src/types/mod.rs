pub mod convert_output;

use std::sync::Arc;

use esmify_common::NormalizedConverterOptions;
use esmify_fs::OsFileSystem;
use esmify_resolver::Resolver;

pub type SharedResolver = Arc<Resolver<OsFileSystem>>;
pub type SharedOptions = Arc<NormalizedConverterOptions>;
