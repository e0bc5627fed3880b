use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::data::sample::SamplePair;
use crate::error::{HealError, Result};
use crate::imaging::to_grayscale;

const CLEAN_DIR: &str = "clean";
const DAMAGED_DIR: &str = "damaged";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// On-disk sample storage: two parallel directories, `clean/` and
/// `damaged/`, holding identically named images that pair by file name.
#[derive(Debug, Clone)]
pub struct SampleStore {
    root: PathBuf,
}

impl SampleStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        SampleStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clean_dir(&self) -> PathBuf {
        self.root.join(CLEAN_DIR)
    }

    pub fn damaged_dir(&self) -> PathBuf {
        self.root.join(DAMAGED_DIR)
    }

    /// Creates both directories if they do not exist.
    pub fn create(&self) -> Result<()> {
        std::fs::create_dir_all(self.clean_dir())?;
        std::fs::create_dir_all(self.damaged_dir())?;
        Ok(())
    }

    pub fn write_pair(&self, pair: &SamplePair) -> Result<()> {
        pair.clean.save(self.clean_dir().join(&pair.name))?;
        pair.damaged.save(self.damaged_dir().join(&pair.name))?;
        Ok(())
    }

    /// Sorted image file names in `dir`.
    fn list_images(dir: &Path) -> Result<Vec<String>> {
        if !dir.is_dir() {
            return Err(HealError::DataIntegrity(format!("{} is not a directory", dir.display())));
        }
        let mut names: Vec<String> = std::fs::read_dir(dir)?
            .flatten()
            .filter_map(|e| {
                let path = e.path();
                let ext = path.extension()?.to_str()?.to_ascii_lowercase();
                if path.is_file() && IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    path.file_name()?.to_str().map(|s| s.to_owned())
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// File names present in both directories, after checking that the two
    /// sides are non-empty and hold exactly the same names.
    pub fn paired_names(&self) -> Result<Vec<String>> {
        let clean = Self::list_images(&self.clean_dir())?;
        let damaged = Self::list_images(&self.damaged_dir())?;

        if clean.is_empty() || damaged.is_empty() {
            return Err(HealError::DataIntegrity(format!(
                "sample store {} is empty ({} clean, {} damaged)",
                self.root.display(), clean.len(), damaged.len()
            )));
        }
        if clean.len() != damaged.len() {
            return Err(HealError::DataIntegrity(format!(
                "{} clean images but {} damaged images", clean.len(), damaged.len()
            )));
        }
        let clean_set: BTreeSet<&String> = clean.iter().collect();
        if let Some(orphan) = damaged.iter().find(|n| !clean_set.contains(n)) {
            return Err(HealError::DataIntegrity(format!("{} has no clean counterpart", orphan)));
        }
        Ok(clean)
    }

    /// Loads every pair, matched by name. With `expected_size`, every image
    /// must be exactly `size × size`.
    pub fn load_pairs(&self, expected_size: Option<u32>) -> Result<Vec<SamplePair>> {
        let names = self.paired_names()?;
        names.par_iter()
            .map(|name| -> Result<SamplePair> {
                let clean = to_grayscale(&image::open(self.clean_dir().join(name))?);
                let damaged = to_grayscale(&image::open(self.damaged_dir().join(name))?);
                if clean.dimensions() != damaged.dimensions() {
                    return Err(HealError::DataIntegrity(format!(
                        "{}: clean is {:?} but damaged is {:?}", name, clean.dimensions(), damaged.dimensions()
                    )));
                }
                if let Some(size) = expected_size {
                    if clean.dimensions() != (size, size) {
                        return Err(HealError::DataIntegrity(format!(
                            "{}: expected {}x{}, found {:?}", name, size, size, clean.dimensions()
                        )));
                    }
                }
                Ok(SamplePair { name: name.clone(), clean, damaged })
            })
            .collect()
    }
}
