pub mod header;
pub mod normalize_options;
pub mod shield;
pub mod stabilize_path;
pub mod text_edits;
