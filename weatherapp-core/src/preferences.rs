//! Small file-backed key-value store for the offline copy of the last result.

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

pub const KEY_CITY_NAME: &str = "city_name";
pub const KEY_WEATHER_RESPONSE: &str = "weather_response";

/// String map persisted as a JSON object.
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Preferences {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                values: BTreeMap::new(),
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
        let values = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences file: {}", path.display()))?;

        Ok(Self { path, values })
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stage changes; nothing is written until [`Editor::apply`].
    pub fn edit(&mut self) -> Editor<'_> {
        Editor {
            prefs: self,
            staged: Vec::new(),
        }
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize preferences")?;

        // Replaced via rename; readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write preferences file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("Failed to replace preferences file: {}", self.path.display())
        })?;

        Ok(())
    }
}

#[must_use = "staged changes are lost unless `apply` is called"]
pub struct Editor<'a> {
    prefs: &'a mut Preferences,
    staged: Vec<(String, String)>,
}

impl Editor<'_> {
    pub fn put_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.staged.push((key.to_string(), value.into()));
        self
    }

    /// Commit all staged changes in memory and on disk.
    pub fn apply(self) -> Result<()> {
        self.prefs.values.extend(self.staged);
        self.prefs.write()
    }
}
