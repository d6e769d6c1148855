//! Staged files and the append-only output manifest.

use std::path::{Path, PathBuf};

/// Role of a file at a given point of the pipeline.
///
/// Variants are ordered by stage; a file's role never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileRole {
    /// Package straight out of the build tool.
    RawPackage,
    /// Debug symbols produced next to the package.
    SymbolFile,
    /// Package renamed to its canonical name.
    RenamedPackage,
    /// Package after zipalign, in `app`.
    AlignedPackage,
    /// Package signed with one key identity.
    SignedPackage,
    /// Zip of the signed outputs.
    Archive,
}

/// A path together with its pipeline role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    path: PathBuf,
    role: FileRole,
}

impl StagedFile {
    /// Creates a staged file.
    pub fn new(path: impl Into<PathBuf>, role: FileRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }

    /// Local path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current role.
    pub fn role(&self) -> FileRole {
        self.role
    }

    /// File name as UTF-8, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Name of the directory holding the file (`origin`, `app`, a key id).
    pub fn parent_name(&self) -> String {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Moves the file to a later stage. Returns `None` if `role` would regress.
    pub fn advance(&self, path: impl Into<PathBuf>, role: FileRole) -> Option<Self> {
        (role >= self.role).then(|| Self::new(path, role))
    }
}

/// Ordered list of files destined for upload.
///
/// Entries are only ever appended; the uploader consumes the list once.
#[derive(Debug, Default, Clone)]
pub struct OutputManifest {
    entries: Vec<StagedFile>,
}

impl OutputManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, file: StagedFile) {
        log::debug!("manifest += {} ({:?})", file.path().display(), file.role());
        self.entries.push(file);
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[StagedFile] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(StagedFile::path)
    }

    /// Entries with the given role.
    pub fn with_role(&self, role: FileRole) -> impl Iterator<Item = &StagedFile> {
        self.entries.iter().filter(move |f| f.role() == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_never_regress() {
        let renamed = StagedFile::new("/o/origin/a.apk", FileRole::RenamedPackage);
        assert!(renamed.advance("/o/app/a.apk", FileRole::AlignedPackage).is_some());
        assert!(renamed.advance("/o/origin/a.apk", FileRole::RawPackage).is_none());
    }

    #[test]
    fn parent_name_is_the_channel_suffix() {
        let signed = StagedFile::new("/o/BuildForAndroid/keyA/a_keyA.apk", FileRole::SignedPackage);
        assert_eq!(signed.parent_name(), "keyA");
        assert_eq!(signed.file_name(), "a_keyA.apk");
    }

    #[test]
    fn manifest_keeps_insertion_order() {
        let mut manifest = OutputManifest::new();
        manifest.push(StagedFile::new("/o/origin/x.symbols.zip", FileRole::SymbolFile));
        manifest.push(StagedFile::new("/o/app/a.apk", FileRole::AlignedPackage));
        manifest.push(StagedFile::new("/o/k/a_k.apk", FileRole::SignedPackage));

        let names: Vec<_> = manifest.entries().iter().map(StagedFile::file_name).collect();
        assert_eq!(names, ["x.symbols.zip", "a.apk", "a_k.apk"]);
        assert_eq!(manifest.with_role(FileRole::SignedPackage).count(), 1);
    }
}
