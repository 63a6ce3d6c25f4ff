use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{BatchError, FileError, NameError};
use crate::format::FormatHint;
use crate::{converter, name, reader, scan, DEFAULT_OUTPUT_DIR, IMPORTED_DIR};

/// How the image stream is located inside a container
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Walk the container header
    #[default]
    Header,
    /// Search for a RIFF/WEBP signature anywhere in the file
    Scan,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Directory receiving the extracted images
    pub output_dir: PathBuf,
    pub strategy: Strategy,
    /// Name unresolvable files after the detected payload format instead of failing
    pub fallback_names: bool,
    /// Overwrite existing files
    pub force: bool,
}

impl Options {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            strategy: Strategy::default(),
            fallback_names: false,
            force: false,
        }
    }
}

/// Cache files found in the import directory
#[derive(Clone, Debug, Default)]
pub struct CacheInventory {
    /// Texture containers, sorted by path
    pub textures: Vec<PathBuf>,
    /// Number of audio caches (counted only)
    pub samples: usize,
}

#[derive(Debug)]
pub enum FileOutcome {
    Extracted { name: String, size: u64 },
    Skipped { name: String },
    Failed { file: String, error: FileError },
}

#[derive(Debug, Default)]
pub struct Summary {
    pub extracted: usize,
    pub skipped: usize,
    pub failed: Vec<(String, FileError)>,
}

impl Summary {
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Extracted { .. } => self.extracted += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { file, error } => self.failed.push((file, error)),
        }
    }

    pub fn total(&self) -> usize {
        self.extracted + self.skipped + self.failed.len()
    }
}

impl FromIterator<FileOutcome> for Summary {
    fn from_iter<I: IntoIterator<Item = FileOutcome>>(iter: I) -> Self {
        let mut summary = Summary::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

/// Get the project root for `path`
pub fn find_project(path: &Path) -> Result<PathBuf, BatchError> {
    let root = match fs::canonicalize(path) {
        Ok(root) => root,
        Err(_) => {
            return Err(BatchError::ProjectNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    if root.join("project.godot").is_file() || root.join(IMPORTED_DIR[0]).is_dir() {
        return Ok(root);
    }

    Err(BatchError::ProjectNotFound { path: root })
}

/// Get the import cache directory of a project
pub fn imported_dir(root: &Path) -> PathBuf {
    IMPORTED_DIR.iter().fold(root.to_path_buf(), |dir, part| dir.join(part))
}

/// Get the default output directory of a project
pub fn default_output_dir(root: &Path) -> PathBuf {
    root.join(DEFAULT_OUTPUT_DIR)
}

/// Get a list of cache files in the import directory
pub fn scan_imported(dir: &Path) -> Result<CacheInventory, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::ImportDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let read_dir_error = |source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut inventory = CacheInventory::default();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if !path.is_file() {
            continue;
        }

        match path.extension().and_then(|extension| extension.to_str()) {
            Some("ctex") => inventory.textures.push(path),
            Some("sample") => inventory.samples += 1,
            _ => {}
        }
    }

    inventory.textures.sort();
    Ok(inventory)
}

/// Create the output directory if it is absent
pub fn prepare_output_dir(dir: &Path) -> Result<(), BatchError> {
    fs::create_dir_all(dir).map_err(|source| BatchError::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Recover the output name and the image stream of one cache file.
///
/// Performs no I/O; `contents` is the whole cache file.
pub fn extract_image<'a>(
    file_name: &str,
    contents: &'a [u8],
    options: &Options,
) -> Result<(String, &'a [u8]), FileError> {
    let resolved = match name::resolve(file_name) {
        Ok(resolved) => Some(resolved),
        Err(NameError::UnrecognizedNamingScheme { .. }) if options.fallback_names => None,
        Err(error) => return Err(error.into()),
    };

    let (payload, hint) = match options.strategy {
        Strategy::Header => {
            let payload = reader::extract(contents)?;
            (payload.bytes, payload.hint)
        }
        Strategy::Scan => {
            let payload = &contents[scan::find_webp(contents)?];
            (payload, FormatHint::detect(payload))
        }
    };

    let output = match resolved {
        Some(resolved) => resolved,
        None => {
            let fallback = name::fallback_name(file_name, hint);
            info!("\"{file_name}\" has no recoverable name, using \"{fallback}\"");
            fallback
        }
    };

    Ok((name::sanitize_file_name(&output), payload))
}

/// Extract one cache file into the output directory.
pub fn process_file(path: &Path, options: &Options) -> FileOutcome {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match try_process_file(path, &file, options) {
        Ok(outcome) => outcome,
        Err(error) => {
            debug!("skipping \"{file}\": {error}");
            FileOutcome::Failed { file, error }
        }
    }
}

/// Extract every file, continuing after failures.
pub fn run(paths: &[PathBuf], options: &Options) -> Summary {
    paths
        .iter()
        .map(|path| process_file(path, options))
        .collect()
}

fn try_process_file(path: &Path, file: &str, options: &Options) -> Result<FileOutcome, FileError> {
    let contents = fs::read(path).map_err(FileError::ReadFile)?;
    let (name, payload) = extract_image(file, &contents, options)?;
    let output = options.output_dir.join(&name);

    if !write_claimed(&output, payload, options.force)? {
        debug!("\"{}\" exists, skipping", output.display());
        return Ok(FileOutcome::Skipped { name });
    }

    let size = converter::usize_to_u64(payload.len())?;
    info!("extracted \"{file}\" to \"{name}\" ({size} bytes)");
    Ok(FileOutcome::Extracted { name, size })
}

/// Write `bytes` unless `path` exists; returns whether the file was written.
///
/// The existence check and the creation are one `create_new` open, so
/// concurrent workers never write the same output twice.
fn write_claimed(path: &Path, bytes: &[u8], force: bool) -> Result<bool, FileError> {
    let mut open_options = fs::OpenOptions::new();
    open_options.write(true);
    if force {
        open_options.create(true).truncate(true);
    } else {
        open_options.create_new(true);
    }

    let write_error = |source| FileError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut output = match open_options.open(path) {
        Ok(output) => output,
        Err(error) if error.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(error) => return Err(write_error(error)),
    };

    if let Err(error) = output.write_all(bytes) {
        drop(output);
        if let Err(remove_error) = fs::remove_file(path) {
            warn!("cannot remove partial \"{}\": {remove_error}", path.display());
        }
        return Err(write_error(error));
    }

    Ok(true)
}
