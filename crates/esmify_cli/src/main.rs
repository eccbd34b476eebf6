mod args;
mod logger;

use std::{process::ExitCode, time::Instant};

use ansi_term::Colour;
use anyhow::Context;
use args::{BundleArgs, InputArgs, LogArgs, OutputArgs};
use clap::Parser;

use esmify::{ConvertOutput, ConvertStatus, Converter, ConverterOptions, InputItem};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[clap(flatten)]
  input: InputArgs,

  #[clap(flatten)]
  output: OutputArgs,

  #[clap(flatten)]
  bundle: BundleArgs,

  #[clap(flatten)]
  log: LogArgs,
}

fn flag(value: bool) -> Option<bool> {
  value.then_some(true)
}

fn load_options(args: Commands) -> anyhow::Result<ConverterOptions> {
  let from_args = ConverterOptions {
    input: (!args.input.input.is_empty())
      .then(|| args.input.input.into_iter().map(InputItem::from).collect()),
    cwd: args.input.cwd,
    root_dir: args.input.root_dir,
    entry_point: args.input.entry,
    follow_links: args.input.no_follow.then_some(false),
    output_dir: args.output.out_dir,
    output_extension: args.output.ext,
    target: args.output.target,
    no_header: flag(args.output.no_header),
    with_report: flag(args.output.report),
    bundle: args.bundle.bundle,
    minify: args.bundle.no_minify.then_some(false),
    import_map: flag(args.bundle.import_map),
    ..ConverterOptions::default()
  };

  let Some(config) = args.input.config else {
    return Ok(from_args);
  };
  let text = std::fs::read_to_string(&config)
    .with_context(|| format!("Cannot read config file `{}`", config.display()))?;
  let from_file: ConverterOptions = serde_json::from_str(&text)
    .with_context(|| format!("Invalid config file `{}`", config.display()))?;
  Ok(from_args.merge(from_file))
}

fn print_modules(output: &ConvertOutput) {
  let dim = Colour::White.dimmed();
  for module in &output.modules {
    let status = match module.status {
      ConvertStatus::Converted => Colour::Green.paint("converted"),
      ConvertStatus::ConvertedWithFallback => Colour::Yellow.paint("converted with fallback"),
      ConvertStatus::Failed => Colour::Red.paint("failed"),
    };
    println!(
      "{} {} {} {}",
      status,
      Colour::Cyan.paint(module.source_path.as_str()),
      dim.paint("→"),
      module.target_path
    );
    for diagnostic in &module.diagnostics {
      println!("  {} {}", dim.paint("│"), diagnostic);
    }
  }
}

fn main() -> ExitCode {
  let args = Commands::parse();
  logger::init_logger(args.log.verbose, args.log.quiet);
  let quiet = args.log.quiet;

  let options = match load_options(args) {
    Ok(options) => options,
    Err(err) => {
      println!("{} {:#}", Colour::Red.paint("Error:"), err);
      return ExitCode::FAILURE;
    }
  };
  let with_report = options.with_report.unwrap_or(false);
  let import_map = options.import_map.unwrap_or(false);

  let start = Instant::now();
  let output = match Converter::new(options).and_then(|converter| converter.write()) {
    Ok(output) => output,
    Err(errors) => {
      for error in &*errors {
        println!("{} {}", Colour::Red.paint("Error:"), error);
      }
      return ExitCode::FAILURE;
    }
  };

  if !quiet {
    print_modules(&output);
    if import_map && !output.import_map.is_empty() {
      let imports = output
        .import_map
        .iter()
        .map(|(name, path)| (name.clone(), serde_json::Value::from(path.as_str())))
        .collect::<serde_json::Map<_, _>>();
      println!("{:#}", serde_json::json!({ "imports": imports }));
    }
  }
  for error in &output.errors {
    println!("{} {}", Colour::Red.paint("Error:"), error);
  }
  if with_report {
    println!("{:#}", output.to_report(true));
  }

  let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
  println!("\n{} Finished in {}", Colour::Green.paint("✔"), Colour::White.bold().paint(elapsed));

  if output.success() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
