use crate::error::{FeederError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One manifest line: image and label paths relative to the dataset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub image: String,
    pub label: String,
}

impl Entry {
    pub fn clip(&self) -> &str {
        clip_id(&self.image)
    }
}

/// Parent-directory segment of a manifest path, `""` when there is none.
pub fn clip_id(path: &str) -> &str {
    path.rsplit('/').nth(1).unwrap_or("")
}

/// Joins a manifest path (which may start with `/`) under `root`.
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    root.join(relative.trim_start_matches('/'))
}

/// Ordered (image, label) pairs of one split.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<Entry>,
}

impl Manifest {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FeederError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::parse(path, &raw)?;
        log::info!("Load manifest: {:?}, {} entries", path, manifest.len());
        Ok(manifest)
    }

    /// `origin` is only used in error messages.
    pub fn parse(origin: &Path, raw: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [image, label] => entries.push(Entry {
                    image: image.to_string(),
                    label: label.to_string(),
                }),
                other => {
                    return Err(FeederError::Manifest {
                        path: origin.to_path_buf(),
                        line: i + 1,
                        reason: format!("expected 2 paths, found {}", other.len()),
                    })
                }
            }
        }
        Ok(Self { entries })
    }

    /// Builds a manifest from a DAVIS tree: every
    /// `JPEGImages/480p/<clip>/<frame>.jpg` that has a matching
    /// `Annotations/480p/<clip>/<frame>.png`, sorted by clip then frame.
    pub fn discover<P: AsRef<Path>>(davis_dir: P) -> Result<Self> {
        let root = davis_dir.as_ref();
        let images_dir = root.join("JPEGImages").join("480p");
        let mut entries = Vec::new();
        let mut missing = 0usize;
        for dent in WalkDir::new(&images_dir).min_depth(2).max_depth(2).sort_by_file_name() {
            let dent = dent.map_err(|e| FeederError::Io {
                path: images_dir.clone(),
                source: e.into(),
            })?;
            let path = dent.path();
            if !dent.file_type().is_file()
                || path.extension().and_then(|s| s.to_str()) != Some("jpg")
            {
                continue;
            }
            let (Some(clip), Some(stem)) = (
                path.parent()
                    .and_then(|p| p.file_name())
                    .and_then(|s| s.to_str()),
                path.file_stem().and_then(|s| s.to_str()),
            ) else {
                continue;
            };
            let label = format!("/Annotations/480p/{clip}/{stem}.png");
            if !resolve(root, &label).is_file() {
                missing += 1;
                log::debug!("no annotation for {:?}, skipped", path);
                continue;
            }
            entries.push(Entry {
                image: format!("/JPEGImages/480p/{clip}/{stem}.jpg"),
                label,
            });
        }
        if missing > 0 {
            log::warn!("{missing} frames without annotation under {:?}", images_dir);
        }
        log::info!("Discovered {} frames under {:?}", entries.len(), images_dir);
        Ok(Self { entries })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| FeederError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut out = String::new();
        for e in &self.entries {
            out.push_str(&e.image);
            out.push(' ');
            out.push_str(&e.label);
            out.push('\n');
        }
        std::fs::write(path, out).map_err(io_err)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Entry> {
        self.entries.get(idx)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
