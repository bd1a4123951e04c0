pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod form;
pub mod ids;
pub mod persistence;
pub mod prompt;
pub mod render;
pub mod session;
pub mod shell;
pub mod stats;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskflow CLI"
  );

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    storage::FileStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open storage at {}",
        data_dir.display()
      )
    })?;

  let mut app = app::App::open(
    storage,
    ids::ClockIds::new()
  );
  app.set_filter(cfg.default_filter()?);
  app.set_sort(cfg.default_sort()?);
  debug!(query = ?app.query(), "initial view preferences");

  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &mut app,
    &cfg,
    &renderer,
    cli.command.unwrap_or_default()
  )?;

  info!("done");
  Ok(())
}
