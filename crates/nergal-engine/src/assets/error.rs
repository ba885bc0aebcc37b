use std::path::PathBuf;

/// Errors raised while loading cached resources.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode `{}`", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported texture format `{extension}` for `{}`", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("shader `{name}` failed to compile: {message}")]
    Compile { name: String, message: String },

    #[error("{stage} shader `{name}` is not supported by this backend")]
    UnsupportedStage { stage: &'static str, name: String },
}
