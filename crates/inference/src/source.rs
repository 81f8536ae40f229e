use crate::error::PipelineError;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// File name suffixes picked up from an image directory. Matched as stored,
/// ImageNet validation dumps use the upper-case `.JPEG`.
pub const IMAGE_SUFFIXES: [&str; 3] = [".JPEG", ".jpg", ".png"];

/// Extension appended to list entries that name an image without one.
const DEFAULT_LIST_EXTENSION: &str = "jpg";

/// Where the images of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Single(PathBuf),
    /// One image per line, relative to `data_root`.
    List { list: PathBuf, data_root: PathBuf },
    Directory { dir: PathBuf, limit: Option<usize> },
}

impl ImageSource {
    /// Pick a source from the parsing flags. A single image wins over a list.
    pub fn from_flags(
        img_path: Option<&Path>,
        img_list: Option<&Path>,
        data_root: Option<&Path>,
    ) -> Result<Self, PipelineError> {
        match (img_path, img_list) {
            (Some(path), _) => Ok(ImageSource::Single(path.to_path_buf())),
            (None, Some(list)) => {
                let data_root = data_root
                    .map(Path::to_path_buf)
                    .or_else(|| list.parent().map(Path::to_path_buf))
                    .unwrap_or_default();
                Ok(ImageSource::List {
                    list: list.to_path_buf(),
                    data_root,
                })
            }
            (None, None) => Err(PipelineError::InvalidSource(
                "either an image path or an image list is required".to_string(),
            )),
        }
    }

    /// Resolve the source to the ordered list of image files to process.
    pub fn images(&self) -> anyhow::Result<Vec<PathBuf>> {
        match self {
            ImageSource::Single(path) => {
                if !path.is_file() {
                    return Err(PipelineError::InvalidSource(format!(
                        "image {} does not exist",
                        path.display()
                    ))
                    .into());
                }
                Ok(vec![path.clone()])
            }
            ImageSource::List { list, data_root } => read_list(list, data_root),
            ImageSource::Directory { dir, limit } => scan_directory(dir, *limit),
        }
    }
}

fn read_list(list: &Path, data_root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !list.is_file() {
        return Err(
            PipelineError::InvalidSource(format!("list file {} does not exist", list.display()))
                .into(),
        );
    }
    let contents = fs::read_to_string(list)
        .with_context(|| format!("Failed to read image list {}", list.display()))?;

    let images = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut path = data_root.join(line);
            if path.extension().is_none() {
                path.set_extension(DEFAULT_LIST_EXTENSION);
            }
            path
        })
        .collect();
    Ok(images)
}

fn scan_directory(dir: &Path, limit: Option<usize>) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PipelineError::InvalidSource(format!(
            "image directory {} does not exist",
            dir.display()
        ))
        .into());
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
            continue;
        };
        if is_image_name(name) {
            images.push(entry.path());
        }
    }

    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    Ok(images)
}

pub fn is_image_name(name: &str) -> bool {
    IMAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// File name without directories or extension, used to name outputs.
pub fn image_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
