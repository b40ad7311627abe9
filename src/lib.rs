//! Disposable on-disk directory trees for tests.
//!
//! Describe a tree as a [`Specification`], paths mapped to file contents or to nothing
//! for directories, and [`build`] it under a fresh temp root. The returned [`Root`]
//! tears the whole tree down again on [`Root::destroy`] or when dropped.
//!
//! # Building a tree
//!
//! ```
//! use scaffold_fixtures::Specification;
//!
//! let spec = Specification::new().file("foo/bar.txt", "baz").dir("bar/baz/biz/");
//! let mut root = scaffold_fixtures::build(&spec).unwrap();
//!
//! assert_eq!(root.read_to_string("foo/bar.txt").unwrap(), "baz");
//! assert!(root.join("bar/baz/biz").is_dir());
//!
//! root.destroy().unwrap();
//! assert!(!root.path().exists());
//! ```
//!
//! # Inline text fixtures
//!
//! ```
//! use scaffold_fixtures::{ScaffoldBuilder, Specification};
//!
//! let spec = Specification::parse(r#"
//!     //- /src/main.rs
//!     fn main() {}
//!     //- /target/
//! "#);
//! let root = ScaffoldBuilder::new().prefix("my_test_").build(&spec).unwrap();
//! assert!(root.join("src/main.rs").is_file());
//! assert!(root.join("target").is_dir());
//! ```
//!
//! # Rejected specifications
//!
//! Directories take no contents and files must have some. A bad entry aborts the build
//! and removes whatever was already created.
//!
//! ```
//! use scaffold_fixtures::Specification;
//!
//! let err = scaffold_fixtures::build(&Specification::new().entry("foo", None)).unwrap_err();
//! assert!(err.is_spec_violation());
//! ```

pub mod error;
pub mod root;
pub mod scratch;
pub mod spec;

pub use error::{Result, ScaffoldError};
pub use root::Root;
pub use scratch::{ScratchSpace, SystemTemp, TempIn};
pub use spec::{Entry, Specification};

/// Build `spec` under a fresh directory in the host temp dir.
pub fn build(spec: &Specification) -> Result<Root> {
	ScaffoldBuilder::new().build(spec)
}

/// Where and how scaffolds get allocated.
pub struct ScaffoldBuilder {
	prefix: String,
	scratch: Box<dyn ScratchSpace>,
}

impl Default for ScaffoldBuilder {
	fn default() -> Self {
		Self {
			prefix: "scaffold_".to_owned(),
			scratch: Box::new(SystemTemp),
		}
	}
}

impl ScaffoldBuilder {
	/// Prefix `scaffold_`, allocating in the host temp dir.
	pub fn new() -> Self {
		Self::default()
	}

	/// Name prefix of allocated root directories.
	pub fn prefix(mut self, prefix: &str) -> Self {
		self.prefix = prefix.to_owned();
		self
	}

	/// Allocate roots from `scratch` instead of the host temp dir.
	pub fn scratch(mut self, scratch: impl ScratchSpace + 'static) -> Self {
		self.scratch = Box::new(scratch);
		self
	}

	/// Allocate a fresh root and materialize every entry of `spec` under it.
	///
	/// The first bad entry or filesystem failure aborts the build; the partially built
	/// root is removed before the error is returned.
	pub fn build(&self, spec: &Specification) -> Result<Root> {
		let path = self.scratch.allocate(&self.prefix).map_err(ScaffoldError::Allocate)?;
		// from here on, an early return drops `root` and with it the tree
		let root = Root::new(path);

		for (key, contents) in spec.iter() {
			let (relative, entry) = spec::classify(key, contents)?;
			match entry {
				Entry::Directory => root.create_dir(relative)?,
				Entry::File(contents) => root.write_file(relative, contents)?,
			}
			tracing::trace!(path = key, "materialized entry");
		}

		tracing::debug!(root = %root.path().display(), entries = spec.len(), "built scaffold");
		Ok(root)
	}
}

/// Strip the indentation shared by all non-blank lines.
///
/// Only ASCII spaces and tabs count as indentation; any other whitespace is content.
/// A single leading newline is dropped too, so fixtures can start on the line after `r#"`.
pub fn trim_indent(text: &str) -> String {
	fn indent_of(line: &str) -> usize {
		line.len() - line.trim_start_matches([' ', '\t']).len()
	}

	let text = text.strip_prefix('\n').unwrap_or(text);
	let common = text.lines().filter(|line| !line.trim().is_empty()).map(indent_of).min().unwrap_or(0);
	// blank lines may be indented less than `common`
	text.split_inclusive('\n').map(|line| &line[indent_of(line).min(common)..]).collect()
}
