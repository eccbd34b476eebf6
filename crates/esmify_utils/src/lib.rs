mod concat_string;

pub mod ecmascript;
pub mod indexmap;
pub mod path_ext;
pub mod path_projection;
pub mod xxhash;
