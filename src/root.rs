//! The live handle to a built scaffold.

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use crate::{
	error::{Result, ScaffoldError},
	spec::Specification,
};

/// A scaffold materialized on disk.
///
/// Owns its root directory exclusively. The tree is removed by [`Root::destroy`], or
/// on drop if the handle was neither destroyed nor [kept](Root::keep).
#[derive(Debug, derive_new::new)]
#[new(visibility = "pub(crate)")]
pub struct Root {
	path: PathBuf,
	#[new(value = "false")]
	kept: bool,
	#[new(value = "false")]
	destroyed: bool,
}

impl Root {
	/// Absolute path of the root directory.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Resolve a specification key under the root. A leading `/` is ignored.
	pub fn join(&self, relative: &str) -> PathBuf {
		self.path.join(relative.trim_start_matches('/'))
	}

	/// Read a file under the root as bytes.
	pub fn read(&self, relative: &str) -> Result<Vec<u8>> {
		let path = self.join(relative);
		fs::read(&path).map_err(|source| ScaffoldError::Read { path, source })
	}

	/// Read a file under the root as UTF-8 text.
	pub fn read_to_string(&self, relative: &str) -> Result<String> {
		let path = self.join(relative);
		fs::read_to_string(&path).map_err(|source| ScaffoldError::Read { path, source })
	}

	/// Describe what is currently on disk under the root.
	///
	/// Every directory shows up as a `dir/` entry and every regular file with its bytes,
	/// including parents that were created implicitly. Anything else (symlinks, sockets) is skipped.
	pub fn snapshot(&self) -> Result<Specification> {
		let mut spec = Specification::new();

		for entry in walkdir::WalkDir::new(&self.path).min_depth(1) {
			let entry = entry.map_err(ScaffoldError::Walk)?;
			let Ok(relative) = entry.path().strip_prefix(&self.path) else {
				continue;
			};
			let key = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");

			let file_type = entry.file_type();
			if file_type.is_dir() {
				spec.insert(format!("{key}/"), None);
			} else if file_type.is_file() {
				let contents = fs::read(entry.path()).map_err(|source| ScaffoldError::Read {
					path: entry.path().to_path_buf(),
					source,
				})?;
				spec.insert(key, Some(contents));
			}
		}

		Ok(spec)
	}

	/// Remove the root and everything below it.
	///
	/// A root that is already gone, wholly or in part, is not an error. Once this succeeds
	/// further calls do nothing.
	pub fn destroy(&mut self) -> Result<()> {
		if self.destroyed {
			return Ok(());
		}
		remove_tree(&self.path)?;
		self.destroyed = true;
		tracing::debug!(path = %self.path.display(), "destroyed scaffold");
		Ok(())
	}

	/// Whether [`Root::destroy`] has succeeded.
	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}

	/// Give up ownership of the tree: it stays on disk after the handle is gone.
	pub fn keep(mut self) -> PathBuf {
		self.kept = true;
		std::mem::take(&mut self.path)
	}

	/// Create `relative` and any missing ancestors. Existing directories are fine.
	pub(crate) fn create_dir(&self, relative: &Path) -> Result<()> {
		let path = self.path.join(relative);
		let mut builder = fs::DirBuilder::new();
		builder.recursive(true);
		#[cfg(unix)]
		{
			use std::os::unix::fs::DirBuilderExt;
			builder.mode(0o700);
		}
		builder.create(&path).map_err(|source| ScaffoldError::CreateDir { path, source })
	}

	/// Write `contents` as the whole of `relative`, creating its parent first.
	pub(crate) fn write_file(&self, relative: &Path, contents: &[u8]) -> Result<()> {
		if let Some(parent) = relative.parent() {
			self.create_dir(parent)?;
		}

		let path = self.path.join(relative);
		let mut options = fs::OpenOptions::new();
		options.write(true).create(true).truncate(true);
		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;
			options.mode(0o600);
		}
		options
			.open(&path)
			.and_then(|mut file| io::Write::write_all(&mut file, contents))
			.map_err(|source| ScaffoldError::WriteFile { path, source })
	}
}

impl Drop for Root {
	fn drop(&mut self) {
		if self.kept || self.destroyed {
			return;
		}
		// best effort, Drop must not fail
		let _ = remove_tree(&self.path);
	}
}

fn remove_tree(path: &Path) -> Result<()> {
	match fs::remove_dir_all(path) {
		Err(e) if e.kind() != io::ErrorKind::NotFound => Err(ScaffoldError::Remove { path: path.to_path_buf(), source: e }),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scratch_root() -> color_eyre::Result<(tempfile::TempDir, Root)> {
		let base = tempfile::tempdir()?;
		let path = base.path().join("root");
		fs::create_dir(&path)?;
		Ok((base, Root::new(path)))
	}

	#[test]
	fn test_write_file_creates_parents() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.write_file(Path::new("a/b/c.txt"), b"hello")?;
		assert!(root.join("a/b").is_dir());
		assert_eq!(root.read("a/b/c.txt")?, b"hello");
		assert_eq!(root.read_to_string("/a/b/c.txt")?, "hello");
		Ok(())
	}

	#[test]
	fn test_write_file_replaces_contents() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.write_file(Path::new("f.txt"), b"a much longer first version")?;
		root.write_file(Path::new("f.txt"), b"short")?;
		assert_eq!(root.read("f.txt")?, b"short");
		Ok(())
	}

	#[test]
	fn test_create_dir_is_idempotent() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.create_dir(Path::new("x/y"))?;
		root.create_dir(Path::new("x/y"))?;
		root.create_dir(Path::new("x"))?;
		assert!(root.join("x/y").is_dir());
		Ok(())
	}

	#[test]
	fn test_write_over_directory_fails() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.create_dir(Path::new("taken"))?;
		let err = root.write_file(Path::new("taken"), b"x").unwrap_err();
		assert!(matches!(err, ScaffoldError::WriteFile { .. }));
		assert!(!err.is_spec_violation());
		Ok(())
	}

	#[test]
	fn test_read_missing_file() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		assert!(matches!(root.read("nope.txt"), Err(ScaffoldError::Read { .. })));
		Ok(())
	}

	#[cfg(unix)]
	#[test]
	fn test_owner_only_modes() -> color_eyre::Result<()> {
		use std::os::unix::fs::PermissionsExt;

		let (_base, root) = scratch_root()?;
		root.write_file(Path::new("d/f.txt"), b"x")?;
		assert_eq!(fs::metadata(root.join("d"))?.permissions().mode() & 0o777, 0o700);
		assert_eq!(fs::metadata(root.join("d/f.txt"))?.permissions().mode() & 0o777, 0o600);
		Ok(())
	}

	#[test]
	fn test_snapshot_lists_everything() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.write_file(Path::new("foo/bar.txt"), b"baz")?;
		root.create_dir(Path::new("bar/baz/biz"))?;
		root.write_file(Path::new("top"), b"")?;

		let expected = Specification::new().dir("bar").dir("bar/baz").dir("bar/baz/biz").dir("foo").file("foo/bar.txt", "baz").file("top", "");
		assert_eq!(root.snapshot()?, expected);
		Ok(())
	}

	#[test]
	fn test_destroy_twice() -> color_eyre::Result<()> {
		let (_base, mut root) = scratch_root()?;
		root.write_file(Path::new("f.txt"), b"x")?;
		root.destroy()?;
		assert!(root.is_destroyed());
		assert!(!root.path().exists());
		root.destroy()?;
		Ok(())
	}

	#[test]
	fn test_destroy_after_external_removal() -> color_eyre::Result<()> {
		let (_base, mut root) = scratch_root()?;
		fs::remove_dir_all(root.path())?;
		root.destroy()?;
		assert!(root.is_destroyed());
		Ok(())
	}

	#[test]
	fn test_drop_removes_tree() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.write_file(Path::new("f.txt"), b"x")?;
		let path = root.path().to_path_buf();
		drop(root);
		assert!(!path.exists());
		Ok(())
	}

	#[test]
	fn test_keep_survives_drop() -> color_eyre::Result<()> {
		let (_base, root) = scratch_root()?;
		root.write_file(Path::new("f.txt"), b"x")?;
		let path = root.keep();
		assert_eq!(fs::read(path.join("f.txt"))?, b"x");
		Ok(())
	}
}
