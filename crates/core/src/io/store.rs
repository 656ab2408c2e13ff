//! Source stores and sinks for label stacks
//!
//! The filtering pass only ever sees these two seams: a [`SourceStore`]
//! that hands out a complete stack for an area of interest, and a [`Sink`]
//! that persists the result together with provenance metadata.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::native::{read_stack, write_stack};
use crate::raster::{LabelStack, Year, YearRange, FIRST_YEAR};

/// Provenance attached to a persisted stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackMetadata {
    /// Asset name the stack is stored under
    pub name: String,
    /// Version tag of the producing run
    pub version: String,
    /// Processing stage, e.g. `"temporal"`
    pub stage: String,
    /// Years covered by the stack
    pub years: YearRange,
    /// Free-form extra properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl StackMetadata {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        stage: impl Into<String>,
        years: YearRange,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            stage: stage.into(),
            years,
            properties: BTreeMap::new(),
        }
    }

    /// Add an extra property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    fn check_matches(&self, stack: &LabelStack) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidParameter {
                name: "name",
                value: String::new(),
                reason: "asset name must not be empty".into(),
            });
        }
        if self.years != stack.years() {
            return Err(Error::InvalidParameter {
                name: "years",
                value: self.years.to_string(),
                reason: format!("stack covers {}", stack.years()),
            });
        }
        Ok(())
    }
}

/// Supplies label stacks for named areas of interest
pub trait SourceStore {
    /// Load the stack for `area`, restricted to `years`.
    ///
    /// Fails with [`Error::MissingYear`] if the stored stack does not cover
    /// every requested year.
    fn load(&self, area: &str, years: YearRange) -> Result<LabelStack>;
}

/// Persists label stacks
pub trait Sink {
    /// Persist `stack` under `metadata.name`
    fn save(&mut self, stack: &LabelStack, metadata: &StackMetadata) -> Result<()>;
}

/// In-process store, mainly for tests and pipelines that never touch disk
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    stacks: HashMap<String, LabelStack>,
    metadata: HashMap<String, StackMetadata>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stack as the source for `area`
    pub fn insert(&mut self, area: impl Into<String>, stack: LabelStack) {
        self.stacks.insert(area.into(), stack);
    }

    /// Stack stored under `name`
    pub fn get(&self, name: &str) -> Option<&LabelStack> {
        self.stacks.get(name)
    }

    /// Metadata saved alongside `name`
    pub fn metadata(&self, name: &str) -> Option<&StackMetadata> {
        self.metadata.get(name)
    }
}

impl SourceStore for MemoryStore {
    fn load(&self, area: &str, years: YearRange) -> Result<LabelStack> {
        let stack = self
            .stacks
            .get(area)
            .ok_or_else(|| Error::NotFound(area.to_string()))?;
        stack.slice_years(years)
    }
}

impl Sink for MemoryStore {
    fn save(&mut self, stack: &LabelStack, metadata: &StackMetadata) -> Result<()> {
        metadata.check_matches(stack)?;
        self.stacks.insert(metadata.name.clone(), stack.clone());
        self.metadata.insert(metadata.name.clone(), metadata.clone());
        Ok(())
    }
}

/// Options for the TIFF-backed store
#[derive(Debug, Clone)]
pub struct TiffStoreOptions {
    /// First year assumed for files with neither page descriptions nor sidecar
    pub first_year: Year,
    /// Extension of stack files, without the dot; `None` for bare names
    pub extension: Option<String>,
}

impl Default for TiffStoreOptions {
    fn default() -> Self {
        Self {
            first_year: FIRST_YEAR,
            extension: Some("tif".into()),
        }
    }
}

/// Directory of `<name>.tif` multi-page stacks with `<name>.json` sidecars
#[derive(Debug, Clone)]
pub struct TiffStore {
    root: PathBuf,
    options: TiffStoreOptions,
}

impl TiffStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, TiffStoreOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: TiffStoreOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Store addressing exactly the stack file at `path`.
    ///
    /// The store is rooted at the file's directory and keeps its extension
    /// as written (`.tiff`, `.TIF` or none). Returns the store and the stack
    /// name to pass to `load` / `save`.
    pub fn for_stack_path(path: impl AsRef<Path>) -> Result<(Self, String)> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidParameter {
                name: "path",
                value: path.display().to_string(),
                reason: "not a stack file path".into(),
            })?
            .to_string();
        let root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let options = TiffStoreOptions {
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned()),
            ..TiffStoreOptions::default()
        };
        Ok((Self::with_options(root, options), name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the TIFF holding `name`
    pub fn stack_path(&self, name: &str) -> PathBuf {
        match &self.options.extension {
            Some(ext) => self.root.join(format!("{}.{}", name, ext)),
            None => self.root.join(name),
        }
    }

    /// Path of the JSON sidecar for `name`
    pub fn metadata_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    /// Read the sidecar for `name`, if one exists
    pub fn load_metadata(&self, name: &str) -> Result<Option<StackMetadata>> {
        let path = self.metadata_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Load the full stack for `area` without restricting years
    pub fn load_all(&self, area: &str) -> Result<LabelStack> {
        let path = self.stack_path(area);
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let first_year = match self.load_metadata(area)? {
            Some(meta) => meta.years.first(),
            None => self.options.first_year,
        };
        let stack = read_stack(&path, first_year)?;
        debug!(
            "Loaded {} ({} x {}, {})",
            path.display(),
            stack.cols(),
            stack.rows(),
            stack.years()
        );
        Ok(stack)
    }
}

impl SourceStore for TiffStore {
    fn load(&self, area: &str, years: YearRange) -> Result<LabelStack> {
        let stack = self.load_all(area)?;
        if stack.years() == years {
            return Ok(stack);
        }
        stack.slice_years(years)
    }
}

impl Sink for TiffStore {
    fn save(&mut self, stack: &LabelStack, metadata: &StackMetadata) -> Result<()> {
        metadata.check_matches(stack)?;
        fs::create_dir_all(&self.root)?;

        let path = self.stack_path(&metadata.name);
        write_stack(stack, &path)?;
        fs::write(
            self.metadata_path(&metadata.name),
            serde_json::to_string_pretty(metadata)?,
        )?;
        info!(
            "Saved {} (version {}, stage {})",
            path.display(),
            metadata.version,
            metadata.stage
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Label;

    fn stack(years: YearRange) -> LabelStack {
        let mut stack = LabelStack::filled(4, 5, years, Label(12));
        stack.set(3, 4, years.first(), Label(3)).unwrap();
        stack
    }

    #[test]
    fn test_memory_store_load_slices_years() {
        let mut store = MemoryStore::new();
        store.insert("pantanal", stack(YearRange::new(1985, 2022).unwrap()));
        let loaded = store.load("pantanal", YearRange::default()).unwrap();
        assert_eq!(loaded.years(), YearRange::default());
        assert_eq!(loaded.get(3, 4, 1985).unwrap(), Label(3));
    }

    #[test]
    fn test_memory_store_missing_area_and_years() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.load("nowhere", YearRange::default()),
            Err(Error::NotFound(_))
        ));
        store.insert("short", stack(YearRange::new(1990, 2020).unwrap()));
        assert!(matches!(
            store.load("short", YearRange::default()),
            Err(Error::MissingYear { year: 1985 })
        ));
    }

    #[test]
    fn test_memory_sink_records_metadata() {
        let mut store = MemoryStore::new();
        let s = stack(YearRange::default());
        let meta = StackMetadata::new("out_v53", "53", "temporal", s.years());
        store.save(&s, &meta).unwrap();
        assert_eq!(store.metadata("out_v53").unwrap().stage, "temporal");
        assert_eq!(store.get("out_v53"), Some(&s));
    }

    #[test]
    fn test_sink_rejects_mismatched_years() {
        let mut store = MemoryStore::new();
        let s = stack(YearRange::default());
        let meta = StackMetadata::new("out", "1", "temporal", YearRange::new(1985, 2000).unwrap());
        assert!(matches!(
            store.save(&s, &meta),
            Err(Error::InvalidParameter { name: "years", .. })
        ));
    }

    #[test]
    fn test_tiff_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TiffStore::new(dir.path());
        let s = stack(YearRange::default());
        let meta = StackMetadata::new("cerrado_temporal_v53", "53", "temporal", s.years())
            .with_property("source", "cerrado_gapfill");
        store.save(&s, &meta).unwrap();

        let back = store.load("cerrado_temporal_v53", YearRange::default()).unwrap();
        assert_eq!(back, s);
        assert_eq!(store.load_metadata("cerrado_temporal_v53").unwrap(), Some(meta));

        let sub = store
            .load("cerrado_temporal_v53", YearRange::new(2000, 2010).unwrap())
            .unwrap();
        assert_eq!(sub.years().len(), 11);
    }

    #[test]
    fn test_stack_path_keeps_extension() {
        let (store, name) = TiffStore::for_stack_path("out/filtered.tiff").unwrap();
        assert_eq!(name, "filtered");
        assert_eq!(store.stack_path(&name), PathBuf::from("out/filtered.tiff"));
        assert_eq!(store.metadata_path(&name), PathBuf::from("out/filtered.json"));

        let (store, name) = TiffStore::for_stack_path("SCENE.TIF").unwrap();
        assert_eq!(store.root(), Path::new("."));
        assert_eq!(store.stack_path(&name), PathBuf::from("./SCENE.TIF"));

        let (store, name) = TiffStore::for_stack_path("stacks/pantanal").unwrap();
        assert_eq!(store.stack_path(&name), PathBuf::from("stacks/pantanal"));
    }

    #[test]
    fn test_tiff_store_roundtrip_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cerrado_v53.tiff");
        let s = stack(YearRange::default());

        let (mut sink, name) = TiffStore::for_stack_path(&path).unwrap();
        let meta = StackMetadata::new(name.clone(), "53", "temporal", s.years());
        sink.save(&s, &meta).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("cerrado_v53.tif").exists());

        let (source, name) = TiffStore::for_stack_path(&path).unwrap();
        assert_eq!(source.load_all(&name).unwrap(), s);
        assert_eq!(source.load_metadata(&name).unwrap(), Some(meta));
    }

    #[test]
    fn test_tiff_store_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = TiffStore::new(dir.path());
        assert!(matches!(
            store.load("missing", YearRange::default()),
            Err(Error::NotFound(_))
        ));
        assert_eq!(store.load_metadata("missing").unwrap(), None);
    }
}
