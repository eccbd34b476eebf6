use std::{path::Path, sync::Arc};

use anyhow::Context;
use esmify_common::ConverterOptions;
use esmify_error::BuildResult;
use esmify_fs::{FileSystem, OsFileSystem};
use esmify_resolver::Resolver;
use sugar_path::SugarPath;

use crate::{
  graph::ModuleGraph,
  stages::{
    bundle::BundleStage,
    convert::{ConvertStage, ConvertStageOutput},
  },
  types::{SharedOptions, SharedResolver, convert_output::ConvertOutput},
  utils::normalize_options::normalize_options,
};

pub struct Converter {
  pub(crate) fs: OsFileSystem,
  pub(crate) options: SharedOptions,
  pub(crate) resolver: SharedResolver,
}

impl Converter {
  pub fn new(options: ConverterOptions) -> BuildResult<Self> {
    let options = normalize_options(options)?;
    let resolver: SharedResolver = Resolver::new(options.cwd.clone(), OsFileSystem).into();
    Ok(Self { fs: OsFileSystem, options: Arc::new(options), resolver })
  }

  /// Converts every reachable module and builds the bundle when configured. Nothing is written.
  pub fn convert(&self) -> BuildResult<ConvertOutput> {
    self.build().map(|(output, _)| output)
  }

  /// Same as `convert`, then writes every module meant for the disk, and the bundle.
  pub fn write(&self) -> BuildResult<ConvertOutput> {
    let (mut output, graph) = self.build()?;

    for module in graph.modules.iter().filter(|module| !module.not_on_disk) {
      let Some(text) = &module.converted_text else {
        continue;
      };
      if module.target_absolute_path == module.absolute_source_path().normalize() {
        output.errors.push(anyhow::anyhow!(
          "Refusing to overwrite `{}` with its own conversion",
          module.source_path
        ));
        continue;
      }
      if let Err(err) = self.write_file(&module.target_absolute_path, text) {
        output.errors.push(err);
      }
    }

    if let (Some(bundle), Some(path)) = (&output.bundle, &self.options.bundle) {
      let path = self.options.cwd.join(path);
      if let Err(err) = self.write_file(&path, bundle) {
        output.errors.push(err);
      }
    }

    Ok(output)
  }

  fn build(&self) -> BuildResult<(ConvertOutput, ModuleGraph)> {
    let stage = ConvertStage::new(self.fs, Arc::clone(&self.options), Arc::clone(&self.resolver))?;
    let ConvertStageOutput { graph, reports } = stage.convert()?;

    let mut output = ConvertOutput {
      modules: reports,
      import_map: graph.import_map.clone(),
      graph: graph.to_records(),
      ..ConvertOutput::default()
    };

    if self.options.bundle.is_some() {
      match BundleStage::new(&graph, &self.options).bundle() {
        Ok(bundle) => output.bundle = Some(bundle),
        Err(errors) => output.errors.extend(errors.0),
      }
    }

    let failed = output.modules.iter().filter(|module| !module.success()).count();
    tracing::info!(
      "Converted {} modules, {} failed, {} run errors",
      output.modules.len(),
      failed,
      output.errors.len()
    );
    Ok((output, graph))
  }

  fn write_file(&self, path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
      self
        .fs
        .create_dir_all(dir)
        .with_context(|| format!("Cannot create directory `{}`", dir.display()))?;
    }
    self
      .fs
      .write(path, content.as_bytes())
      .with_context(|| format!("Cannot write `{}`", path.display()))?;
    tracing::debug!("Wrote `{}`", path.display());
    Ok(())
  }
}
