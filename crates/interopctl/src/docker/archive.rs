use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Emacs and vim leave these behind next to Dockerfiles.
fn is_backup(name: &str) -> bool {
    name.ends_with('~') || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
}

/// Deletes editor backup files under `dir`, returning what was removed.
pub fn remove_backups(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            removed.extend(remove_backups(&path)?);
        } else if is_backup(&entry.file_name().to_string_lossy()) {
            std::fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

/// Writes `dir` as a gzip'd tarball to `dest`, rooted at the directory's
/// own name so it unpacks as `<remote_root>/<name>`. A partial `dest` is
/// removed on failure.
pub fn write_tarball(dir: &Path, dest: &Path) -> io::Result<()> {
    let written = build_tarball(dir, dest);
    if written.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    written
}

fn build_tarball(dir: &Path, dest: &Path) -> io::Result<()> {
    let root = dir
        .canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf())
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "dockerfile".into());

    let gz = flate2::write::GzEncoder::new(File::create(dest)?, flate2::Compression::default());
    let mut tar = tar::Builder::new(gz);
    tar.append_dir_all(&root, dir)?;
    tar.into_inner()?.finish()?;
    Ok(())
}
