extern crate miette;
extern crate thiserror;

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConverterError {
    #[error("error converting an value")]
    #[diagnostic(code(libctex::try_from_int_error))]
    TryFromIntError(#[from] std::num::TryFromIntError),

    #[error("region overflows the address space (offset {offset}, length {length})")]
    #[diagnostic(code(libctex::overflow))]
    Overflow { offset: usize, length: usize },
}

#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum NameError {
    #[error("\"{name}\" is not a cache file (expected the {expected:?} extension)")]
    #[diagnostic(code(libctex::not_a_cache_file))]
    NotACacheFile { name: String, expected: &'static str },

    #[error("\"{name}\" does not follow the <name>.<ext>-<hash>.ctex naming scheme")]
    #[diagnostic(
        code(libctex::unrecognized_naming_scheme),
        help("use --fallback-names to name such files after their payload format")
    )]
    UnrecognizedNamingScheme { name: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum ReaderError {
    #[error(transparent)]
    #[diagnostic(code(libctex::convert_error))]
    ConvertValue(#[from] ConverterError),

    #[error("incorrect container format (magic {received:02X?})")]
    #[diagnostic(code(libctex::invalid_container_format))]
    InvalidContainerFormat { received: Vec<u8> },

    #[error("unsupported container version (supported up to {supported}, received {received})")]
    #[diagnostic(code(libctex::unsupported_version))]
    UnsupportedVersion { supported: u32, received: u32 },

    #[error("unsupported data format {received} (only PNG and WebP streams are embedded)")]
    #[diagnostic(
        code(libctex::unsupported_data_format),
        help("try the --scan strategy")
    )]
    UnsupportedDataFormat { received: u32 },

    #[error("container is truncated while reading {field} at offset {offset} (file is {size} bytes)")]
    #[diagnostic(code(libctex::truncated_container))]
    TruncatedContainer {
        field: &'static str,
        offset: usize,
        size: usize,
    },

    #[error("container has no embedded payload")]
    #[diagnostic(code(libctex::no_embedded_payload))]
    NoEmbeddedPayload,
}

#[derive(Error, Diagnostic, Debug)]
pub enum ScanError {
    #[error("no RIFF/WEBP stream found in {size} bytes")]
    #[diagnostic(code(libctex::no_webp_signature))]
    NoWebpSignature { size: usize },
}

/// Failure of a single cache file. Never fatal to the batch.
#[derive(Error, Diagnostic, Debug)]
pub enum FileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ConvertValue(#[from] ConverterError),

    #[error("cache file reading error")]
    #[diagnostic(code(libctex::io_error))]
    ReadFile(#[source] std::io::Error),

    #[error("cannot write \"{}\"", .path.display())]
    #[diagnostic(code(libctex::write_error))]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Diagnostic, Debug)]
pub enum BatchError {
    #[error("no Godot project found at \"{}\"", .path.display())]
    #[diagnostic(
        code(libctex::project_not_found),
        help("the directory must contain a project.godot file or a .godot directory")
    )]
    ProjectNotFound { path: PathBuf },

    #[error("import cache directory \"{}\" is missing", .path.display())]
    #[diagnostic(
        code(libctex::import_dir_missing),
        help("open the project in the Godot 4 editor once to generate the import cache")
    )]
    ImportDirMissing { path: PathBuf },

    #[error("cannot create output directory \"{}\"", .path.display())]
    #[diagnostic(code(libctex::create_output_dir))]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read directory \"{}\"", .path.display())]
    #[diagnostic(code(libctex::read_dir))]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
