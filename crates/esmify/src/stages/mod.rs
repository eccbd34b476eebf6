pub mod bundle;
pub mod convert;
