use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::view::{
  SortBy,
  StatusFilter
};

pub const RC_ENV: &str = "TASKFLOWRC";

const DEFAULTS: [(&str, &str); 5] = [
  ("data.location", "~/.taskflow"),
  ("color", "on"),
  ("default.filter", "all"),
  ("default.sort", "priority"),
  ("confirm.delete", "on")
];

#[derive(Debug, Clone)]
pub struct Config {
  map: BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      map:          DEFAULTS
        .iter()
        .map(|(k, v)| {
          (k.to_string(), v.to_string())
        })
        .collect(),
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_rc_path(rc_override)? {
      | Some(path) => {
        info!(rc = %path.display(), "loading rc file");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!(
          "no rc file found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self.map.get(key).map(String::as_str)
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .get(key)
      .map(|v| {
        parse_bool(v).ok_or_else(|| {
          anyhow!(
            "invalid boolean for \
             {key}: {v}"
          )
        })
      })
      .transpose()
  }

  pub fn default_filter(
    &self
  ) -> anyhow::Result<StatusFilter> {
    self
      .get("default.filter")
      .map(str::parse::<StatusFilter>)
      .transpose()
      .context("default.filter")
      .map(Option::unwrap_or_default)
  }

  pub fn default_sort(
    &self
  ) -> anyhow::Result<SortBy> {
    self
      .get("default.sort")
      .map(str::parse::<SortBy>)
      .transpose()
      .context("default.sort")
      .map(Option::unwrap_or_default)
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    Ok(
      self
        .get_bool("color")?
        .unwrap_or(true)
    )
  }

  pub fn confirm_delete(
    &self
  ) -> anyhow::Result<bool> {
    Ok(
      self
        .get_bool("confirm.delete")?
        .unwrap_or(true)
    )
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    if self.loaded_files.contains(&path)
    {
      return Err(anyhow!(
        "rc include cycle at {}",
        path.display()
      ));
    }

    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self
      .loaded_files
      .push(path.clone());
    self.load_str(&text, &path)
  }

  fn load_str(
    &mut self,
    text: &str,
    path: &Path
  ) -> anyhow::Result<()> {
    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = override_dir {
    return Ok(path.to_path_buf());
  }

  match cfg.get("data.location") {
    | Some(value)
      if !value.trim().is_empty() =>
    {
      Ok(expand_tilde(Path::new(value)))
    }
    | _ => {
      Ok(home_dir()?.join(".taskflow"))
    }
  }
}

fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    return Ok(None);
  };
  let candidate =
    home.join(".taskflowrc");
  Ok(candidate.exists().then_some(candidate))
}

fn home_dir() -> anyhow::Result<PathBuf>
{
  dirs::home_dir().ok_or_else(|| {
    anyhow!(
      "cannot determine home \
       directory"
    )
  })
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
