use std::{io, path::PathBuf};

pub type Result<T, E = ScaffoldError> = std::result::Result<T, E>;

/// Everything that can go wrong while building, reading or tearing down a scaffold.
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
	#[error("failed to allocate scratch directory: {0}")]
	Allocate(#[source] io::Error),

	#[error("directory {path:?} should not be given contents")]
	DirectoryWithContent { path: String },

	#[error("file {path:?} should be given contents")]
	FileWithoutContent { path: String },

	#[error("entry {path:?} resolves outside of the scaffold root")]
	EscapesRoot { path: String },

	#[error("failed to create directory {}: {source}", path.display())]
	CreateDir { path: PathBuf, source: io::Error },

	#[error("failed to write file {}: {source}", path.display())]
	WriteFile { path: PathBuf, source: io::Error },

	#[error("failed to read {}: {source}", path.display())]
	Read { path: PathBuf, source: io::Error },

	#[error("failed to walk scaffold tree: {0}")]
	Walk(#[source] walkdir::Error),

	#[error("failed to remove {}: {source}", path.display())]
	Remove { path: PathBuf, source: io::Error },
}

impl ScaffoldError {
	/// Whether the error comes from a malformed specification rather than the filesystem.
	pub fn is_spec_violation(&self) -> bool {
		matches!(self, Self::DirectoryWithContent { .. } | Self::FileWithoutContent { .. } | Self::EscapesRoot { .. })
	}
}
