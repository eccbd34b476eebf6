mod converter;
mod graph;
mod stages;
mod types;
mod utils;

pub use crate::{converter::Converter, types::convert_output::ConvertOutput};
pub use esmify_common::*;
pub use esmify_error::{BuildError, BuildResult};
