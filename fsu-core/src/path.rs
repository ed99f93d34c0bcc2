//! Path model shared by every backend
//!
//! A [`FsPath`] is a root designator plus a list of segments. Parsing is done
//! once, up front, against the grammar of a [`PathStyle`]; after that both
//! backends see the same value. `.` and `..` are kept as ordinary segments
//! until [`FsPath::resolve_dots`] is called, since resolving them lexically
//! changes meaning when a symlink is involved.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{FsError, FsResult};
use crate::platform::Platform;

/// Characters Windows refuses inside a path segment
const WINDOWS_RESERVED: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Path grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    /// Grammar of the platform this crate was compiled for
    pub const NATIVE: PathStyle = Platform::CURRENT.path_style();

    pub fn separator(self) -> char {
        match self {
            PathStyle::Posix => '/',
            PathStyle::Windows => '\\',
        }
    }

    pub fn is_separator(self, c: char) -> bool {
        match self {
            PathStyle::Posix => c == '/',
            PathStyle::Windows => is_windows_separator(c),
        }
    }

    pub fn is_case_sensitive(self) -> bool {
        self == PathStyle::Posix
    }
}

fn is_windows_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Segment as used for comparisons under `style`
fn fold(segment: &str, style: PathStyle) -> Cow<'_, str> {
    if style.is_case_sensitive() {
        Cow::Borrowed(segment)
    } else {
        Cow::Owned(segment.to_uppercase())
    }
}

/// Compare two segments (e.g. directory entry names) under the rules of `style`.
pub fn segments_equal(a: &str, b: &str, style: PathStyle) -> bool {
    fold(a, style) == fold(b, style)
}

/// Root designator of a path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Root {
    /// No root, resolved against the working directory
    Relative,
    /// `/` on POSIX, `\` (root of the current drive) on Windows
    Separator,
    /// `C:`, relative to the working directory of that drive
    Drive(char),
    /// `C:\`
    DriveAbsolute(char),
    /// `\\server\share`
    Unc { server: String, share: String },
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
enum RootKey<'a> {
    Relative,
    Separator,
    Drive(char),
    DriveAbsolute(char),
    Unc(Cow<'a, str>, Cow<'a, str>),
}

impl Root {
    fn key(&self) -> RootKey<'_> {
        match self {
            Root::Relative => RootKey::Relative,
            Root::Separator => RootKey::Separator,
            Root::Drive(c) => RootKey::Drive(*c),
            Root::DriveAbsolute(c) => RootKey::DriveAbsolute(*c),
            Root::Unc { server, share } => RootKey::Unc(
                fold(server, PathStyle::Windows),
                fold(share, PathStyle::Windows),
            ),
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Root::Relative)
    }

    pub fn drive(&self) -> Option<char> {
        match self {
            Root::Drive(c) | Root::DriveAbsolute(c) => Some(*c),
            _ => None,
        }
    }
}

impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Root {}

/// Normalized file-system path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsPath {
    style: PathStyle,
    root: Root,
    segments: Vec<String>,
}

impl FsPath {
    /// Parse `raw` with the grammar of the compiled-for platform.
    pub fn normalize(raw: &str) -> FsResult<Self> {
        Self::normalize_with(raw, PathStyle::NATIVE)
    }

    /// Parse `raw` with an explicit grammar.
    pub fn normalize_with(raw: &str, style: PathStyle) -> FsResult<Self> {
        if raw.is_empty() {
            return Err(FsError::InvalidPath("empty path".into()));
        }
        if raw.contains('\0') {
            return Err(FsError::InvalidPath(format!(
                "{}: contains NUL",
                raw.escape_debug()
            )));
        }

        let (root, rest) = match style {
            PathStyle::Posix => match raw.strip_prefix('/') {
                Some(rest) => (Root::Separator, rest),
                None => (Root::Relative, raw),
            },
            PathStyle::Windows => split_windows_root(raw)?,
        };

        let segments = rest
            .split(|c| style.is_separator(c))
            .filter(|s| !s.is_empty())
            .map(|s| validate_segment(s, style, raw).map(String::from))
            .collect::<FsResult<Vec<_>>>()?;

        Ok(Self {
            style,
            root,
            segments,
        })
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Fully qualified: does not depend on a working directory or current drive
    pub fn is_absolute(&self) -> bool {
        match self.style {
            PathStyle::Posix => matches!(self.root, Root::Separator),
            PathStyle::Windows => matches!(self.root, Root::DriveAbsolute(_) | Root::Unc { .. }),
        }
    }

    pub fn has_root(&self) -> bool {
        !self.root.is_relative()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments
            .last()
            .map(|s| s.as_str())
            .filter(|s| *s != "..")
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name()
            .and_then(|n| n.rsplit_once('.'))
            .filter(|(stem, _)| !stem.is_empty())
            .map(|(_, ext)| ext)
    }

    /// Path with the last segment removed. `None` for a bare root or a
    /// single relative segment.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() || (self.root.is_relative() && self.segments.len() == 1) {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self {
            style: self.style,
            root: self.root.clone(),
            segments,
        })
    }

    /// Append `child`.
    ///
    /// A rooted child is only accepted where the platform defines the mix:
    /// on Windows `\x` onto a drive or share keeps that drive or share, and
    /// `C:x` onto a path on drive `C:` appends.
    pub fn join(&self, child: &FsPath) -> FsResult<FsPath> {
        if self.style != child.style {
            return Err(FsError::InvalidPath(format!(
                "cannot join {:?} path {} onto {:?} path {}",
                child.style, child, self.style, self
            )));
        }

        let (root, keep_base) = match (&self.root, &child.root) {
            (_, Root::Relative) => (self.root.clone(), true),
            (Root::Drive(b) | Root::DriveAbsolute(b), Root::Separator) => {
                (Root::DriveAbsolute(*b), false)
            }
            (Root::Unc { .. }, Root::Separator) => (self.root.clone(), false),
            (Root::Drive(b) | Root::DriveAbsolute(b), Root::Drive(c)) if b == c => {
                (self.root.clone(), true)
            }
            _ => {
                return Err(FsError::InvalidPath(format!(
                    "cannot join rooted path {} onto {}",
                    child, self
                )))
            }
        };

        let mut segments = if keep_base {
            self.segments.clone()
        } else {
            Vec::with_capacity(child.segments.len())
        };
        segments.extend(child.segments.iter().cloned());
        Ok(Self {
            style: self.style,
            root,
            segments,
        })
    }

    /// Normalize `child` with this path's grammar, then [`join`](Self::join).
    pub fn join_str(&self, child: &str) -> FsResult<FsPath> {
        self.join(&FsPath::normalize_with(child, self.style)?)
    }

    /// Root (if any) followed by each segment, root-to-leaf.
    pub fn components(&self) -> Components<'_> {
        Components {
            root: if self.root.is_relative() {
                None
            } else {
                Some(&self.root)
            },
            segments: self.segments.iter(),
        }
    }

    pub fn starts_with(&self, base: &FsPath) -> bool {
        self.style == base.style
            && self.root.key() == base.root.key()
            && base.segments.len() <= self.segments.len()
            && base
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| segments_equal(a, b, self.style))
    }

    /// Lexically remove `.` and fold `..` into its predecessor.
    ///
    /// `..` directly under a root is dropped; leading `..` of a relative path
    /// is kept. Only call this when symlinks along the path do not matter.
    pub fn resolve_dots(&self) -> FsPath {
        let keep_leading_parent = matches!(self.root, Root::Relative | Root::Drive(_));
        let mut out: Vec<String> = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            match seg.as_str() {
                "." => {}
                ".." => match out.last() {
                    Some(last) if last.as_str() != ".." => {
                        out.pop();
                    }
                    _ if keep_leading_parent => out.push(seg.clone()),
                    _ => {}
                },
                _ => out.push(seg.clone()),
            }
        }
        if out.is_empty() && self.root.is_relative() {
            out.push(".".to_string());
        }
        Self {
            style: self.style,
            root: self.root.clone(),
            segments: out,
        }
    }

    fn folded(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.segments.iter().map(move |s| fold(s, self.style))
    }
}

fn split_windows_root(raw: &str) -> FsResult<(Root, &str)> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if is_windows_separator(a) && is_windows_separator(b) => {
            let rest = raw[2..].trim_start_matches(is_windows_separator);
            let (server, rest) = split_at_separator(rest);
            let (share, rest) = split_at_separator(rest.trim_start_matches(is_windows_separator));
            if server.is_empty() || share.is_empty() {
                return Err(FsError::InvalidPath(format!(
                    "{}: UNC path needs a server and a share",
                    raw
                )));
            }
            validate_segment(server, PathStyle::Windows, raw)?;
            validate_segment(share, PathStyle::Windows, raw)?;
            Ok((
                Root::Unc {
                    server: server.to_string(),
                    share: share.to_string(),
                },
                rest,
            ))
        }
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
            let rest = &raw[2..];
            let letter = letter.to_ascii_uppercase();
            if rest.starts_with(is_windows_separator) {
                Ok((Root::DriveAbsolute(letter), rest))
            } else {
                Ok((Root::Drive(letter), rest))
            }
        }
        (Some(a), _) if is_windows_separator(a) => Ok((Root::Separator, &raw[1..])),
        _ => Ok((Root::Relative, raw)),
    }
}

fn split_at_separator(s: &str) -> (&str, &str) {
    match s.find(is_windows_separator) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

fn validate_segment<'a>(segment: &'a str, style: PathStyle, raw: &str) -> FsResult<&'a str> {
    if style == PathStyle::Windows {
        if let Some(c) = segment
            .chars()
            .find(|c| WINDOWS_RESERVED.contains(c) || (*c as u32) < 0x20)
        {
            return Err(FsError::InvalidPath(format!(
                "{}: illegal character {:?}",
                raw.escape_debug(),
                c
            )));
        }
    }
    Ok(segment)
}

impl fmt::Display for FsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.style.separator();
        match &self.root {
            Root::Relative => {}
            Root::Separator => write!(f, "{}", sep)?,
            Root::Drive(c) => write!(f, "{}:", c)?,
            Root::DriveAbsolute(c) => write!(f, "{}:{}", c, sep)?,
            Root::Unc { server, share } => {
                write!(f, "{sep}{sep}{server}{sep}{share}")?;
                if !self.segments.is_empty() {
                    write!(f, "{}", sep)?;
                }
            }
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", sep)?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

impl PartialEq for FsPath {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style
            && self.root.key() == other.root.key()
            && self.segments.len() == other.segments.len()
            && self.folded().eq(other.folded())
    }
}

impl Eq for FsPath {}

impl Hash for FsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.style.hash(state);
        self.root.key().hash(state);
        self.segments.len().hash(state);
        for seg in self.folded() {
            seg.hash(state);
        }
    }
}

impl PartialOrd for FsPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FsPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style
            .cmp(&other.style)
            .then_with(|| self.root.key().cmp(&other.root.key()))
            .then_with(|| self.folded().cmp(other.folded()))
    }
}

impl FromStr for FsPath {
    type Err = FsError;

    fn from_str(s: &str) -> FsResult<Self> {
        FsPath::normalize(s)
    }
}

impl TryFrom<&std::path::Path> for FsPath {
    type Error = FsError;

    fn try_from(path: &std::path::Path) -> FsResult<Self> {
        let raw = path
            .to_str()
            .ok_or_else(|| FsError::InvalidPath(format!("{}: not valid UTF-8", path.display())))?;
        FsPath::normalize(raw)
    }
}

/// One step of a path, see [`FsPath::components`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    Root(&'a Root),
    CurDir,
    ParentDir,
    Normal(&'a str),
}

/// Iterator over the components of a [`FsPath`]
#[derive(Debug, Clone)]
pub struct Components<'a> {
    root: Option<&'a Root>,
    segments: std::slice::Iter<'a, String>,
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Component<'a>> {
        if let Some(root) = self.root.take() {
            return Some(Component::Root(root));
        }
        self.segments.next().map(|seg| match seg.as_str() {
            "." => Component::CurDir,
            ".." => Component::ParentDir,
            other => Component::Normal(other),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.segments.len() + usize::from(self.root.is_some());
        (n, Some(n))
    }
}

impl ExactSizeIterator for Components<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn posix(raw: &str) -> FsPath {
        FsPath::normalize_with(raw, PathStyle::Posix).unwrap()
    }

    fn win(raw: &str) -> FsPath {
        FsPath::normalize_with(raw, PathStyle::Windows).unwrap()
    }

    #[test]
    fn test_posix_absolute() {
        let path = posix("/home/user/docs");
        assert_eq!(path.root(), &Root::Separator);
        assert_eq!(path.segments(), ["home", "user", "docs"]);
        assert!(path.is_absolute());
        assert_eq!(path.to_string(), "/home/user/docs");
    }

    #[test]
    fn test_posix_collapses_separators() {
        let path = posix("//home//user//");
        assert_eq!(path.segments(), ["home", "user"]);
        assert_eq!(path.to_string(), "/home/user");
    }

    #[test]
    fn test_posix_root_only() {
        let path = posix("/");
        assert!(path.segments().is_empty());
        assert_eq!(path.to_string(), "/");
    }

    #[test]
    fn test_posix_backslash_is_a_name_character() {
        let path = posix("a\\b");
        assert_eq!(path.segments(), ["a\\b"]);
    }

    #[test]
    fn test_posix_keeps_dots() {
        let path = posix("a/./b/../c");
        assert_eq!(path.segments(), ["a", ".", "b", "..", "c"]);
    }

    #[test]
    fn test_rejects_empty_and_nul() {
        for style in [PathStyle::Posix, PathStyle::Windows] {
            assert!(matches!(
                FsPath::normalize_with("", style),
                Err(FsError::InvalidPath(_))
            ));
            assert!(matches!(
                FsPath::normalize_with("a\0b", style),
                Err(FsError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_windows_drive_absolute() {
        let path = win("c:/Users\\me//file.txt");
        assert_eq!(path.root(), &Root::DriveAbsolute('C'));
        assert_eq!(path.segments(), ["Users", "me", "file.txt"]);
        assert!(path.is_absolute());
        assert_eq!(path.to_string(), "C:\\Users\\me\\file.txt");
    }

    #[test]
    fn test_windows_drive_relative() {
        let path = win("D:notes");
        assert_eq!(path.root(), &Root::Drive('D'));
        assert!(!path.is_absolute());
        assert!(path.has_root());
        assert_eq!(path.to_string(), "D:notes");
    }

    #[test]
    fn test_windows_unc() {
        let path = win("\\\\server\\share\\dir\\f");
        assert_eq!(
            path.root(),
            &Root::Unc {
                server: "server".into(),
                share: "share".into()
            }
        );
        assert_eq!(path.segments(), ["dir", "f"]);
        assert_eq!(path.to_string(), "\\\\server\\share\\dir\\f");

        let bare = win("//server/share");
        assert!(bare.segments().is_empty());
        assert_eq!(bare.to_string(), "\\\\server\\share");
    }

    #[test]
    fn test_windows_unc_needs_share() {
        assert!(FsPath::normalize_with("\\\\server", PathStyle::Windows).is_err());
        assert!(FsPath::normalize_with("\\\\", PathStyle::Windows).is_err());
    }

    #[test]
    fn test_windows_illegal_characters() {
        for raw in ["a<b", "a>b", "dir\\a|b", "what?", "star*", "quo\"te", "ab:c", "C:\\x:y", "tab\tname"] {
            assert!(
                matches!(
                    FsPath::normalize_with(raw, PathStyle::Windows),
                    Err(FsError::InvalidPath(_))
                ),
                "{raw} should be rejected"
            );
        }
        // Same names are fine on POSIX
        assert!(FsPath::normalize_with("what?", PathStyle::Posix).is_ok());
        assert!(FsPath::normalize_with("ab:c", PathStyle::Posix).is_ok());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            (PathStyle::Posix, "/a//b/"),
            (PathStyle::Posix, "rel/./x/.."),
            (PathStyle::Posix, "/"),
            (PathStyle::Windows, "c:/x/y"),
            (PathStyle::Windows, "C:"),
            (PathStyle::Windows, "C:\\"),
            (PathStyle::Windows, "\\top"),
            (PathStyle::Windows, "/"),
            (PathStyle::Windows, "//srv/share"),
            (PathStyle::Windows, "\\\\srv\\share\\a\\"),
            (PathStyle::Windows, "a/b\\c"),
        ];
        for (style, raw) in samples {
            let once = FsPath::normalize_with(raw, style).unwrap();
            let twice = FsPath::normalize_with(&once.to_string(), style).unwrap();
            assert_eq!(once, twice, "{raw}");
            assert_eq!(once.to_string(), twice.to_string(), "{raw}");
        }
    }

    #[test]
    fn test_case_rules() {
        assert_ne!(posix("/Home/A"), posix("/home/a"));
        assert_eq!(win("C:\\Home\\A"), win("c:/home/a"));
        assert_eq!(win("\\\\SRV\\Share\\x"), win("\\\\srv\\share\\X"));
        assert!(segments_equal("README", "readme", PathStyle::Windows));
        assert!(!segments_equal("README", "readme", PathStyle::Posix));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(win("C:\\Dir\\File.TXT"));
        assert!(set.contains(&win("c:\\dir\\file.txt")));

        let mut set = HashSet::new();
        set.insert(posix("/Dir/File"));
        assert!(!set.contains(&posix("/dir/file")));
    }

    #[test]
    fn test_ordering() {
        let mut paths = vec![win("c:\\b"), win("C:\\A"), win("c:\\a\\x")];
        paths.sort();
        let rendered: Vec<_> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, ["C:\\A", "C:\\a\\x", "C:\\b"]);

        assert!(posix("/B") < posix("/a"));
    }

    #[test]
    fn test_styles_never_equal() {
        assert_ne!(posix("a"), win("a"));
    }

    #[test]
    fn test_join_relative() {
        let path = posix("/home").join_str("user/docs").unwrap();
        assert_eq!(path.to_string(), "/home/user/docs");

        let path = win("C:\\x").join_str("y/z").unwrap();
        assert_eq!(path.to_string(), "C:\\x\\y\\z");
    }

    #[test]
    fn test_join_keeps_dots() {
        let path = posix("/home/user").join_str("../pictures").unwrap();
        assert_eq!(path.segments(), ["home", "user", "..", "pictures"]);
    }

    #[test]
    fn test_join_rooted_child_fails_on_posix() {
        let err = posix("/home").join_str("/etc").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)));
        assert!(posix("rel").join_str("/etc").is_err());
    }

    #[test]
    fn test_join_windows_mixing_rules() {
        let path = win("C:\\x\\y").join_str("\\top").unwrap();
        assert_eq!(path.to_string(), "C:\\top");

        let path = win("C:\\x").join_str("c:more").unwrap();
        assert_eq!(path.to_string(), "C:\\x\\more");

        assert!(win("C:\\x").join_str("D:more").is_err());
        assert!(win("C:\\x").join_str("D:\\abs").is_err());
        assert!(win("rel").join_str("\\top").is_err());

        let path = win("\\\\srv\\share\\a").join_str("\\b").unwrap();
        assert_eq!(path.to_string(), "\\\\srv\\share\\b");
    }

    #[test]
    fn test_join_mixed_styles_fails() {
        assert!(posix("/a").join(&win("b")).is_err());
    }

    #[test]
    fn test_components_root_to_leaf() {
        let path = posix("/a/./../b");
        let components: Vec<_> = path.components().collect();
        assert_eq!(
            components,
            [
                Component::Root(&Root::Separator),
                Component::Normal("a"),
                Component::CurDir,
                Component::ParentDir,
                Component::Normal("b"),
            ]
        );
    }

    #[test]
    fn test_components_restartable() {
        let path = win("C:\\a\\b");
        let iter = path.components();
        assert_eq!(iter.len(), 3);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(path.components().count(), 3);
    }

    #[test]
    fn test_components_relative_has_no_root() {
        let path = posix("a/b");
        assert_eq!(
            path.components().collect::<Vec<_>>(),
            [Component::Normal("a"), Component::Normal("b")]
        );
    }

    #[test]
    fn test_parent() {
        assert_eq!(posix("/a/b").parent().unwrap(), posix("/a"));
        assert_eq!(posix("/a").parent().unwrap(), posix("/"));
        assert!(posix("/").parent().is_none());
        assert_eq!(posix("a/b").parent().unwrap(), posix("a"));
        assert!(posix("a").parent().is_none());
        assert_eq!(win("C:\\a").parent().unwrap(), win("C:\\"));
    }

    #[test]
    fn test_file_name_and_extension() {
        let path = posix("/home/user/file.txt");
        assert_eq!(path.file_name(), Some("file.txt"));
        assert_eq!(path.extension(), Some("txt"));

        assert_eq!(posix("/archive.tar.gz").extension(), Some("gz"));
        assert!(posix("/home/file").extension().is_none());
        assert!(posix("/home/.bashrc").extension().is_none());
        assert!(posix("/").file_name().is_none());
        assert!(posix("a/..").file_name().is_none());
    }

    #[test]
    fn test_resolve_dots() {
        assert_eq!(posix("/a/./b/../c").resolve_dots(), posix("/a/c"));
        assert_eq!(posix("/../a").resolve_dots(), posix("/a"));
        assert_eq!(posix("../../a/..").resolve_dots(), posix("../.."));
        assert_eq!(posix("a/..").resolve_dots(), posix("."));
        assert_eq!(win("C:\\x\\..\\..\\y").resolve_dots(), win("C:\\y"));
        assert_eq!(win("C:..\\y").resolve_dots(), win("C:..\\y"));
    }

    #[test]
    fn test_starts_with() {
        assert!(posix("/a/b/c").starts_with(&posix("/a/b")));
        assert!(!posix("/a/bc").starts_with(&posix("/a/b/c")));
        assert!(!posix("a/b").starts_with(&posix("/a")));
        assert!(win("C:\\Dir\\x").starts_with(&win("c:\\dir")));
    }

    #[test]
    fn test_from_str_uses_native_style() {
        let path: FsPath = "a/b".parse().unwrap();
        assert_eq!(path.style(), PathStyle::NATIVE);
        assert_eq!(path.segments(), ["a", "b"]);
    }

    #[test]
    fn test_try_from_std_path() {
        let std_path = std::path::Path::new("dir");
        let path = FsPath::try_from(std_path).unwrap();
        assert_eq!(path.segments(), ["dir"]);
    }

    #[test]
    fn test_serde_round_trip_preserves_equality() {
        let path = win("\\\\srv\\share\\Docs");
        let json = serde_json::to_string(&path).unwrap();
        let back: FsPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert_eq!(back.to_string(), path.to_string());
    }
}
