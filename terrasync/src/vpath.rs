//! Slash-separated paths inside the TerraSync repository namespace.
//!
//! A virtual path never refers to the host filesystem directly: `/` is the
//! root of the repository wherever it happens to be stored (remote server,
//! local mirror). Two concrete types share the read-only API through
//! [`VirtualPathLike`]:
//!
//! - [`VirtualPath`] is immutable and hashable, suitable as a set or map key.
//! - [`MutableVirtualPath`] can be extended in place with `/=` and is
//!   not hashable.
//!
//! `==` only compares values of the same type. Use
//! [`VirtualPathLike::same_path`] to compare across the two types.

use crate::utils::errors::VirtualPathError;
use std::convert::Infallible;
use std::fmt;
use std::ops::{Div, DivAssign};
use std::str::FromStr;

/// Canonical string form of a virtual path.
///
/// The result always starts with `/`, never contains consecutive slashes or
/// `.` components, and only ends with `/` when it is the root itself. A path
/// that does not start with `/` is taken relative to the root, so `""`
/// normalizes to `"/"`. Leading slashes collapse whatever their count,
/// including the POSIX "exactly two" case.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);

    for component in raw.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        out.push('/');
        out.push_str(component);
    }

    if out.is_empty() {
        out.push('/');
    }

    out
}

/// Read-only operations shared by [`VirtualPath`] and [`MutableVirtualPath`].
pub trait VirtualPathLike: Sized {
    /// Build an instance from any raw string, normalizing it.
    fn from_raw(raw: &str) -> Self;

    /// The canonical string form.
    fn as_str(&self) -> &str;

    fn is_root(&self) -> bool {
        self.as_str() == "/"
    }

    /// Same as [`as_str`](Self::as_str).
    fn as_posix(&self) -> &str {
        self.as_str()
    }

    /// The path without its leading `/` (empty for the root).
    fn as_relative(&self) -> &str {
        &self.as_str()[1..]
    }

    /// Compare with any other virtual path type on the canonical string.
    fn same_path<P: VirtualPathLike>(&self, other: &P) -> bool {
        self.as_str() == other.as_str()
    }

    /// Final component, empty only for the root.
    fn name(&self) -> &str {
        let path = self.as_str();
        match path.rfind('/') {
            Some(pos) => &path[pos + 1..],
            None => path,
        }
    }

    /// `["/", "foo", "bar"]` for `/foo/bar`.
    fn parts(&self) -> Vec<&str> {
        let mut parts = vec!["/"];
        if !self.is_root() {
            parts.extend(self.as_relative().split('/'));
        }
        parts
    }

    /// Extension of the final component including the dot, or `""`.
    fn suffix(&self) -> &str {
        let name = self.name();
        name.rfind('.').map_or("", |pos| &name[pos..])
    }

    /// All extensions of the final component, e.g. `[".tar", ".gz"]`.
    fn suffixes(&self) -> Vec<&str> {
        let name = self.name();
        let mut suffixes = Vec::new();
        let mut end = name.len();
        while let Some(pos) = name[..end].rfind('.') {
            suffixes.push(&name[pos..end]);
            end = pos;
        }
        suffixes.reverse();
        suffixes
    }

    /// Final component without its last suffix.
    fn stem(&self) -> &str {
        let name = self.name();
        &name[..name.len() - self.suffix().len()]
    }

    /// Logical parent; the parent of the root is the root.
    fn parent(&self) -> Self {
        let path = self.as_str();
        match path.rfind('/') {
            Some(0) | None => Self::from_raw("/"),
            Some(pos) => Self::from_raw(&path[..pos]),
        }
    }

    /// Ancestors from the nearest to the root. Empty for the root itself.
    fn parents(&self) -> Vec<Self> {
        let path = self.as_str();
        let mut parents = Vec::new();
        if self.is_root() {
            return parents;
        }

        let mut end = path.len();
        while let Some(pos) = path[..end].rfind('/') {
            if pos == 0 {
                break;
            }
            parents.push(Self::from_raw(&path[..pos]));
            end = pos;
        }
        parents.push(Self::from_raw("/"));
        parents
    }

    /// Append a relative component such as `"dir"` or `"dir/sub"`.
    ///
    /// # Panics
    ///
    /// Panics if `component` starts or ends with `/`.
    fn join(&self, component: &str) -> Self {
        assert!(
            !component.starts_with('/') && !component.ends_with('/'),
            "cannot append {component:?} to a virtual path"
        );
        if self.is_root() {
            Self::from_raw(&format!("/{component}"))
        } else {
            Self::from_raw(&format!("{}/{component}", self.as_str()))
        }
    }

    /// Join every component in turn.
    fn joinpath(&self, components: &[&str]) -> Self {
        self.join(&components.join("/"))
    }

    /// Path relative to `prefix`, without a leading slash.
    fn relative_to(&self, prefix: &str) -> Result<String, VirtualPathError> {
        let prefix = normalize(prefix);
        let path = self.as_str();

        if prefix == "/" {
            return Ok(self.as_relative().to_string());
        }
        if path == prefix {
            return Ok(String::new());
        }

        match path.strip_prefix(prefix.as_str()) {
            Some(rest) if rest.starts_with('/') => Ok(rest[1..].to_string()),
            _ => Err(VirtualPathError::NotAPrefix {
                path: path.to_string(),
                prefix,
            }),
        }
    }

    /// Replace the final component.
    fn with_name(&self, name: &str) -> Result<Self, VirtualPathError> {
        if self.is_root() {
            return Err(VirtualPathError::EmptyName(self.as_str().to_string()));
        }
        Ok(Self::from_raw(&format!("{}/{name}", self.parent().as_str())))
    }

    /// Replace the last suffix of the final component (or add one).
    fn with_suffix(&self, suffix: &str) -> Result<Self, VirtualPathError> {
        if self.is_root() {
            return Err(VirtualPathError::EmptyName(self.as_str().to_string()));
        }
        if !suffix.is_empty() && (!suffix.starts_with('.') || suffix == "." || suffix.contains('/'))
        {
            return Err(VirtualPathError::InvalidSuffix(suffix.to_string()));
        }
        let name = format!("{}{suffix}", self.stem());
        self.with_name(&name)
    }
}

/// Immutable, hashable virtual path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath {
    path: String,
}

impl VirtualPath {
    pub fn new(raw: &str) -> Self {
        Self {
            path: normalize(raw),
        }
    }

    pub fn root() -> Self {
        Self::new("/")
    }
}

impl VirtualPathLike for VirtualPath {
    fn from_raw(raw: &str) -> Self {
        Self::new(raw)
    }

    fn as_str(&self) -> &str {
        &self.path
    }
}

impl Default for VirtualPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl FromStr for VirtualPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for VirtualPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<MutableVirtualPath> for VirtualPath {
    fn from(path: MutableVirtualPath) -> Self {
        Self { path: path.path }
    }
}

impl Div<&str> for &VirtualPath {
    type Output = VirtualPath;

    fn div(self, component: &str) -> VirtualPath {
        self.join(component)
    }
}

impl Div<&str> for VirtualPath {
    type Output = VirtualPath;

    fn div(self, component: &str) -> VirtualPath {
        self.join(component)
    }
}

/// Virtual path that can grow in place. Not hashable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MutableVirtualPath {
    path: String,
}

impl MutableVirtualPath {
    pub fn new(raw: &str) -> Self {
        Self {
            path: normalize(raw),
        }
    }

    /// Append a relative component in place and re-normalize.
    ///
    /// # Panics
    ///
    /// Panics if `component` starts or ends with `/`.
    pub fn push(&mut self, component: &str) {
        assert!(
            !component.starts_with('/') && !component.ends_with('/'),
            "cannot append {component:?} to a virtual path"
        );
        if self.path != "/" {
            self.path.push('/');
        }
        self.path.push_str(component);
        self.path = normalize(&self.path);
    }

    /// Snapshot as an immutable path.
    pub fn freeze(&self) -> VirtualPath {
        VirtualPath {
            path: self.path.clone(),
        }
    }
}

impl VirtualPathLike for MutableVirtualPath {
    fn from_raw(raw: &str) -> Self {
        Self::new(raw)
    }

    fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for MutableVirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<VirtualPath> for MutableVirtualPath {
    fn from(path: VirtualPath) -> Self {
        Self { path: path.path }
    }
}

impl Div<&str> for &MutableVirtualPath {
    type Output = MutableVirtualPath;

    fn div(self, component: &str) -> MutableVirtualPath {
        self.join(component)
    }
}

impl DivAssign<&str> for MutableVirtualPath {
    fn div_assign(&mut self, component: &str) {
        self.push(component);
    }
}
