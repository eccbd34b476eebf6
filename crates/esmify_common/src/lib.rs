mod converter_options;
mod module;
mod types;

pub use crate::{
  converter_options::{
    ConverterOptions,
    input_item::{InputItem, NormalizedInputItem},
    normalized_converter_options::NormalizedConverterOptions,
    replacement::{Replacement, ReplacementRule},
  },
  module::module_entry::{ModuleEntry, ModuleKind},
  types::{
    diagnostic::{Diagnostic, DiagnosticKind},
    exported_name::ExportedName,
    extracted_site::{ExtractedSite, ImportBinding, NamedBinding},
    graph_record::GraphRecord,
    import_map::ImportMap,
    module_report::{ConvertStatus, ModuleReport},
    raw_idx::ModuleIdx,
  },
};
