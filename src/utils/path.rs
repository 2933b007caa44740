use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{PdfExtractionError, Result};
use crate::utils::pdf::has_pdf_signature;

/// Turns user input into an absolute, lexically clean path.
///
/// Expands a leading `~`, anchors relative paths at the current directory and
/// resolves `.` / `..` without touching the filesystem.
pub fn normalize_path(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains('\0') {
        return Err(PdfExtractionError::InvalidPath(raw.to_string()));
    }

    let expanded = expand_home(trimmed)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(|_| PdfExtractionError::InvalidPath(raw.to_string()))?
            .join(expanded)
    };

    Ok(clean(&absolute))
}

fn expand_home(input: &str) -> Result<PathBuf> {
    let rest = match input.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(input)),
    };
    let home = dirs::home_dir().ok_or_else(|| PdfExtractionError::InvalidPath(input.to_string()))?;
    let rest = rest.trim_start_matches(['/', '\\']);
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to go above the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Checks that `path` names an existing, readable regular file.
pub fn validate_path(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfExtractionError::PermissionDenied(path.to_path_buf()))
        }
        Err(_) => return Err(PdfExtractionError::FileNotFound(path.to_path_buf())),
    };
    if !metadata.is_file() {
        return Err(PdfExtractionError::InvalidPath(path.display().to_string()));
    }
    fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PdfExtractionError::PermissionDenied(path.to_path_buf()),
        _ => PdfExtractionError::FileNotFound(path.to_path_buf()),
    })?;
    Ok(())
}

/// Extension check only, case-insensitive.
pub fn is_pdf_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reads the head of the file and looks for the `%PDF-` header.
pub fn file_has_pdf_signature(path: &Path) -> bool {
    use std::io::Read;

    let mut head = [0u8; 1024];
    let Ok(mut file) = fs::File::open(path) else {
        return false;
    };
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return false,
        }
    }
    has_pdf_signature(&head[..filled])
}
