use camino::{Utf8Path, Utf8PathBuf};

use crate::magtrack_errors::MagTrackError;

/// List the files of `dir` carrying `extension`, sorted by file name.
///
/// The sort order is what makes batch runs reproducible: line numbers are assigned from it.
///
/// Errors
/// ----------
/// * [`MagTrackError::NoInputError`] when no file matches.
/// * [`MagTrackError::IoError`] when the directory cannot be listed.
pub fn list_input_files(dir: &Utf8Path, extension: &str) -> Result<Vec<Utf8PathBuf>, MagTrackError> {
    let mut files = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension() == Some(extension) {
            files.push(path.to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(MagTrackError::NoInputError(
            dir.to_path_buf(),
            extension.to_string(),
        ));
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// File stem used to label outputs derived from `path`.
pub(crate) fn stem_of(path: &Utf8Path) -> Result<&str, MagTrackError> {
    path.file_stem()
        .ok_or_else(|| MagTrackError::Utf8PathError(format!("{path} has no file name")))
}
