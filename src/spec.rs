//! Declarative description of a directory tree.

use std::{
	collections::BTreeMap,
	fmt::{self, Write as _},
	path::{Component, Path},
};

use crate::{
	error::{Result, ScaffoldError},
	trim_indent,
};

/// Relative paths mapped to file contents, or to nothing for directories.
///
/// A key ending in a path separator is a directory and must carry no contents.
/// Any other key is a file and must carry contents (empty is fine).
/// Rule violations are only reported when the specification is built.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Specification {
	entries: BTreeMap<String, Option<Vec<u8>>>,
}

/// What a single valid entry asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entry<'a> {
	Directory,
	File(&'a [u8]),
}

/// Whether `key` denotes a directory, i.e. ends with a path separator.
pub fn is_dir_key(key: &str) -> bool {
	key.ends_with(std::path::is_separator)
}

impl Specification {
	/// An empty specification.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a directory entry. A trailing `/` is appended if missing.
	pub fn dir(mut self, path: impl Into<String>) -> Self {
		let mut path = path.into();
		if !is_dir_key(&path) {
			path.push('/');
		}
		self.insert(path, None);
		self
	}

	/// Add a file entry with the given contents.
	pub fn file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
		self.insert(path, Some(contents.into()));
		self
	}

	/// Add an entry verbatim, without checking it against the directory/file rules.
	pub fn entry(mut self, path: impl Into<String>, contents: Option<Vec<u8>>) -> Self {
		self.insert(path, contents);
		self
	}

	/// Insert an entry verbatim, returning the previous value for the same key.
	pub fn insert(&mut self, path: impl Into<String>, contents: Option<Vec<u8>>) -> Option<Option<Vec<u8>>> {
		self.entries.insert(path.into(), contents)
	}

	/// `None` if the key is absent, `Some(None)` for a content-less entry.
	pub fn get(&self, path: &str) -> Option<Option<&[u8]>> {
		self.entries.get(path).map(Option::as_deref)
	}

	/// Whether an entry with exactly this key exists.
	pub fn contains(&self, path: &str) -> bool {
		self.entries.contains_key(path)
	}

	/// Entries in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[u8]>)> {
		self.entries.iter().map(|(path, contents)| (path.as_str(), contents.as_deref()))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether there are no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Parse an inline text fixture.
	///
	/// Each `//- /path` line starts a new entry and the lines below it are its contents.
	/// Paths ending in `/` are directories; they take no contents, so anything but blank
	/// lines under one is kept and later rejected by the builder. Text before the first
	/// marker is ignored.
	///
	/// ```
	/// use scaffold_fixtures::Specification;
	///
	/// let spec = Specification::parse(r#"
	///     //- /src/main.rs
	///     fn main() {}
	///     //- /assets/
	/// "#);
	/// assert_eq!(spec.get("src/main.rs"), Some(Some(&b"fn main() {}\n"[..])));
	/// assert_eq!(spec.get("assets/"), Some(None));
	/// ```
	pub fn parse(text: &str) -> Self {
		let text = trim_indent(text);
		let mut spec = Self::new();
		let mut current: Option<(String, String)> = None;

		for line in text.split_inclusive('\n') {
			if let Some(meta) = line.strip_prefix("//-") {
				if let Some((path, body)) = current.take() {
					spec.insert_parsed(path, body);
				}
				let path = meta.split_whitespace().next().unwrap_or_default();
				current = Some((path.trim_start_matches('/').to_owned(), String::new()));
			} else if let Some((_, body)) = current.as_mut() {
				body.push_str(line);
			}
		}
		if let Some((path, body)) = current {
			spec.insert_parsed(path, body);
		}

		spec
	}

	fn insert_parsed(&mut self, path: String, body: String) {
		let contents = if is_dir_key(&path) && body.trim().is_empty() { None } else { Some(body.into_bytes()) };
		self.insert(path, contents);
	}
}

/// Check one entry against the directory/file rules and the root boundary.
pub(crate) fn classify<'a>(key: &'a str, contents: Option<&'a [u8]>) -> Result<(&'a Path, Entry<'a>)> {
	let entry = match (is_dir_key(key), contents) {
		(true, None) => Entry::Directory,
		(true, Some(_)) => return Err(ScaffoldError::DirectoryWithContent { path: key.to_owned() }),
		(false, Some(contents)) => Entry::File(contents),
		(false, None) => return Err(ScaffoldError::FileWithoutContent { path: key.to_owned() }),
	};

	// must name something strictly below the root: no `..`, no root or prefix, not the root itself
	let relative = Path::new(key);
	let mut components = relative.components();
	let inside = components.clone().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
	if !inside || !components.any(|c| matches!(c, Component::Normal(_))) {
		return Err(ScaffoldError::EscapesRoot { path: key.to_owned() });
	}

	Ok((relative, entry))
}

/// Renders in the same `//- /path` format [`Specification::parse`] reads.
/// File contents are decoded lossily and always end with a newline.
impl fmt::Display for Specification {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (path, contents) in self.iter() {
			writeln!(f, "//- /{path}")?;
			if let Some(contents) = contents {
				let text = String::from_utf8_lossy(contents);
				f.write_str(&text)?;
				if !text.is_empty() && !text.ends_with('\n') {
					f.write_char('\n')?;
				}
			}
		}
		Ok(())
	}
}

impl<K, V> FromIterator<(K, Option<V>)> for Specification
where
	K: Into<String>,
	V: Into<Vec<u8>>,
{
	fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
		let mut spec = Self::new();
		spec.extend(iter);
		spec
	}
}

impl<K, V> Extend<(K, Option<V>)> for Specification
where
	K: Into<String>,
	V: Into<Vec<u8>>,
{
	fn extend<I: IntoIterator<Item = (K, Option<V>)>>(&mut self, iter: I) {
		for (path, contents) in iter {
			self.insert(path, contents.map(Into::into));
		}
	}
}
