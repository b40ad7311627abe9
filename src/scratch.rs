//! Providers of fresh scratch directories.
//!
//! A scaffold never picks its own location: it asks a [`ScratchSpace`] for one.
//! The default is the host temp dir; tests can hand in anything else.

use std::{
	io,
	path::{Path, PathBuf},
};

/// Source of freshly created, uniquely named, empty directories.
///
/// The returned directory is owned by the caller from then on: the provider must not
/// remove it or hand it out again.
pub trait ScratchSpace: Send + Sync {
	/// Create a new empty directory whose name starts with `prefix`.
	fn allocate(&self, prefix: &str) -> io::Result<PathBuf>;
}

/// The host's temp directory (`std::env::temp_dir()`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTemp;

impl ScratchSpace for SystemTemp {
	fn allocate(&self, prefix: &str) -> io::Result<PathBuf> {
		allocate_in(&std::env::temp_dir(), prefix)
	}
}

/// An explicit base directory, which must already exist.
#[derive(Clone, Debug)]
pub struct TempIn(pub PathBuf);

impl ScratchSpace for TempIn {
	fn allocate(&self, prefix: &str) -> io::Result<PathBuf> {
		allocate_in(&self.0, prefix)
	}
}

fn allocate_in(base: &Path, prefix: &str) -> io::Result<PathBuf> {
	let mut builder = tempfile::Builder::new();
	builder.prefix(prefix);
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		builder.permissions(std::fs::Permissions::from_mode(0o700));
	}
	let dir = builder.tempdir_in(base)?;
	tracing::debug!(path = %dir.path().display(), "allocated scratch directory");
	Ok(dir.keep())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_allocations_are_unique() -> color_eyre::Result<()> {
		let base = tempfile::tempdir()?;
		let scratch = TempIn(base.path().to_path_buf());

		let a = scratch.allocate("same_")?;
		let b = scratch.allocate("same_")?;
		assert_ne!(a, b);
		assert!(a.is_dir() && b.is_dir());
		assert!(a.starts_with(base.path()));
		assert!(a.file_name().unwrap().to_string_lossy().starts_with("same_"));
		assert_eq!(std::fs::read_dir(&a)?.count(), 0);
		Ok(())
	}

	#[test]
	fn test_missing_base_fails() {
		let scratch = TempIn(PathBuf::from("/definitely/not/a/real/base"));
		assert!(scratch.allocate("x_").is_err());
	}

	#[cfg(unix)]
	#[test]
	fn test_owner_only_mode() -> color_eyre::Result<()> {
		use std::os::unix::fs::PermissionsExt;

		let base = tempfile::tempdir()?;
		let dir = TempIn(base.path().to_path_buf()).allocate("mode_")?;
		let mode = std::fs::metadata(&dir)?.permissions().mode();
		assert_eq!(mode & 0o777, 0o700);
		Ok(())
	}

	#[test]
	fn test_system_temp_lands_in_temp_dir() -> color_eyre::Result<()> {
		let dir = SystemTemp.allocate("scaffold_test_")?;
		assert!(dir.starts_with(std::env::temp_dir()));
		std::fs::remove_dir_all(&dir)?;
		Ok(())
	}
}
