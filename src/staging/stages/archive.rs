//! Optional zip of the signed outputs.

use crate::staging::{
    BuildContext, FileRole, OutputManifest, StagedFile,
    error::{Error, ErrorExt, Result},
    utils::fs,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Writes `files` into a deflated zip at `archive`, named relative to `base`.
pub fn zip_files(archive: &Path, base: &Path, files: &[PathBuf]) -> Result<()> {
    let file = std::fs::File::create(archive).fs_context("creating archive", archive)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .strip_prefix(base)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        writer.start_file(name, options)?;
        let content = std::fs::read(path).fs_context("reading for archive", path)?;
        writer
            .write_all(&content)
            .fs_context("writing archive entry", archive)?;
    }

    writer.finish()?;
    Ok(())
}

/// Zips every signed package that exists on disk and appends the archive to
/// the manifest. Signed outputs whose signer failed are skipped here.
pub async fn archive_signed(
    context: &BuildContext,
    manifest: &mut OutputManifest,
) -> Result<Option<PathBuf>> {
    let files: Vec<PathBuf> = manifest
        .with_role(FileRole::SignedPackage)
        .map(|f| f.path().to_path_buf())
        .filter(|p| p.is_file())
        .collect();
    if files.is_empty() {
        log::info!("No signed packages to archive");
        return Ok(None);
    }

    let dir = context.archive_dir();
    fs::create_fresh_dir(&dir).await?;
    let archive = dir.join(format!(
        "{}_{}_{}_{}.zip",
        context.product_name(),
        context.method_key(),
        context.product().commit_id,
        context.version_label()
    ));

    let base = context.output_root().to_path_buf();
    let target = archive.clone();
    tokio::task::spawn_blocking(move || zip_files(&target, &base, &files))
        .await
        .map_err(|e| Error::GenericError(format!("archive task panicked: {e}")))??;

    log::info!("Archived signed packages into {}", archive.display());
    manifest.push(StagedFile::new(&archive, FileRole::Archive));
    Ok(Some(archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn entries_are_relative_to_base() {
        let tmp = tempfile::tempdir().unwrap();
        let key_dir = tmp.path().join("keyA");
        std::fs::create_dir(&key_dir).unwrap();
        let signed = key_dir.join("a_keyA.apk");
        std::fs::write(&signed, "signed").unwrap();
        let archive = tmp.path().join("out.zip");

        zip_files(&archive, tmp.path(), &[signed]).unwrap();

        let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
        let mut entry = zip.by_name("keyA/a_keyA.apk").unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "signed");
    }
}
