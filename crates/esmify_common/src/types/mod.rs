pub mod diagnostic;
pub mod exported_name;
pub mod extracted_site;
pub mod graph_record;
pub mod import_map;
pub mod module_report;
pub mod raw_idx;
