//! Sibling file discovery.
//!
//! A shapefile is a set of files sharing one base name: `.shp`, `.shx`,
//! `.dbf` and optionally `.prj` and `.cpg`. Any of the three mandatory files
//! can be used to locate the others.

use crate::common::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Extensions of the files making up one shapefile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sibling {
    Shp,
    Shx,
    Dbf,
    Prj,
    Cpg,
}

impl Sibling {
    pub const ALL: [Sibling; 5] = [Sibling::Shp, Sibling::Shx, Sibling::Dbf, Sibling::Prj, Sibling::Cpg];

    pub fn extension(self) -> &'static str {
        match self {
            Sibling::Shp => "shp",
            Sibling::Shx => "shx",
            Sibling::Dbf => "dbf",
            Sibling::Prj => "prj",
            Sibling::Cpg => "cpg",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.extension().eq_ignore_ascii_case(ext))
    }
}

/// Paths of the files making up one shapefile; each is present only when
/// the file exists (or, after a save, was written).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiblingPaths {
    pub shp: Option<PathBuf>,
    pub shx: Option<PathBuf>,
    pub dbf: Option<PathBuf>,
    pub prj: Option<PathBuf>,
    pub cpg: Option<PathBuf>,
}

impl SiblingPaths {
    /// Locate the siblings of `path`, which must name an existing `.shp`,
    /// `.shx` or `.dbf` file.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile(path.display().to_string()));
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match Sibling::from_extension(ext) {
            Some(Sibling::Shp | Sibling::Shx | Sibling::Dbf) => {},
            _ => {
                return Err(Error::Unsupported(format!(
                    "{} is not a .shp, .shx or .dbf file",
                    path.display()
                )));
            },
        }

        let mut paths = Self::default();
        for sibling in Sibling::ALL {
            *paths.slot(sibling) = find_sibling(path, sibling.extension());
        }
        Ok(paths)
    }

    /// Paths for writing `name.*` into `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, name: &str) -> Self {
        let base = dir.as_ref().join(name);
        let with = |ext: &str| Some(base.with_extension(ext));
        Self {
            shp: with("shp"),
            shx: with("shx"),
            dbf: with("dbf"),
            prj: with("prj"),
            cpg: with("cpg"),
        }
    }

    pub fn get(&self, sibling: Sibling) -> Option<&Path> {
        match sibling {
            Sibling::Shp => self.shp.as_deref(),
            Sibling::Shx => self.shx.as_deref(),
            Sibling::Dbf => self.dbf.as_deref(),
            Sibling::Prj => self.prj.as_deref(),
            Sibling::Cpg => self.cpg.as_deref(),
        }
    }

    /// Path of `sibling`, failing with [`Error::MissingFile`] when absent.
    pub fn require(&self, sibling: Sibling) -> Result<&Path> {
        self.get(sibling)
            .ok_or_else(|| Error::MissingFile(format!(".{} file", sibling.extension())))
    }

    pub fn slot(&mut self, sibling: Sibling) -> &mut Option<PathBuf> {
        match sibling {
            Sibling::Shp => &mut self.shp,
            Sibling::Shx => &mut self.shx,
            Sibling::Dbf => &mut self.dbf,
            Sibling::Prj => &mut self.prj,
            Sibling::Cpg => &mut self.cpg,
        }
    }

    /// Every known path.
    pub fn iter(&self) -> impl Iterator<Item = &Path> + '_ {
        Sibling::ALL.into_iter().filter_map(|s| self.get(s))
    }
}

/// Find `path` with its extension replaced by `ext`, trying the lower and
/// upper case spellings.
fn find_sibling(path: &Path, ext: &str) -> Option<PathBuf> {
    [ext.to_ascii_lowercase(), ext.to_ascii_uppercase()]
        .into_iter()
        .map(|e| path.with_extension(e))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_from_any_member() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ["shp", "shx", "DBF"] {
            fs::write(dir.path().join(format!("roads.{}", ext)), b"").unwrap();
        }

        let paths = SiblingPaths::discover(dir.path().join("roads.shx")).unwrap();
        assert_eq!(paths.shp, Some(dir.path().join("roads.shp")));
        assert_eq!(paths.dbf, Some(dir.path().join("roads.DBF")));
        assert_eq!(paths.prj, None);
        assert!(paths.require(Sibling::Prj).is_err());
        assert_eq!(paths.iter().count(), 3);
    }

    #[test]
    fn test_discover_rejects_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let prj = dir.path().join("roads.prj");
        fs::write(&prj, b"GEOGCS[]").unwrap();
        assert!(matches!(SiblingPaths::discover(&prj), Err(Error::Unsupported(_))));
        assert!(matches!(
            SiblingPaths::discover(dir.path().join("missing.shp")),
            Err(Error::MissingFile(_))
        ));
    }

    #[test]
    fn test_output_paths() {
        let paths = SiblingPaths::in_dir("/tmp/out", "rivers");
        assert_eq!(paths.shx, Some(PathBuf::from("/tmp/out/rivers.shx")));
        assert_eq!(paths.iter().count(), 5);
    }
}
