use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct InputArgs {
  /// Files to convert. Their dependencies are discovered from them.
  pub input: Vec<String>,

  #[clap(long)]
  pub cwd: Option<PathBuf>,

  /// Part of the source paths that is replaced by the output dir.
  #[clap(long)]
  pub root_dir: Option<String>,

  /// File whose init function starts the bundle.
  #[clap(long)]
  pub entry: Option<String>,

  /// Only convert the given files.
  #[clap(long)]
  pub no_follow: bool,

  /// JSON file with the same shape as the converter options.
  #[clap(long, short = 'c')]
  pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct OutputArgs {
  #[clap(long, short = 'd')]
  pub out_dir: Option<String>,

  /// Extension of converted scripts.
  #[clap(long)]
  pub ext: Option<String>,

  /// Name matched by `//#skip[...]`-style directives.
  #[clap(long)]
  pub target: Option<String>,

  #[clap(long)]
  pub no_header: bool,

  /// Print the converted text of every file as JSON.
  #[clap(long)]
  pub report: bool,
}

#[derive(Args)]
pub struct BundleArgs {
  /// Also write every converted module into this single file.
  #[clap(long, short = 'b')]
  pub bundle: Option<String>,

  #[clap(long)]
  pub no_minify: bool,

  /// Keep bare specifiers and print the import map instead.
  #[clap(long)]
  pub import_map: bool,
}

#[derive(Args)]
pub struct LogArgs {
  #[clap(long, short = 'v', conflicts_with = "quiet")]
  pub verbose: bool,

  #[clap(long, short = 'q')]
  pub quiet: bool,
}
