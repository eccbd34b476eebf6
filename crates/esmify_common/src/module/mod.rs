pub mod module_entry;
