//! Input resolution for PDF files

use crate::error::{Error, Result};
use crate::pdf::has_pdf_header;
use glob::{MatchOptions, Pattern};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name pattern used when expanding directories
pub const DEFAULT_PATTERN: &str = "*.pdf";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

fn read_header(path: &Path) -> Result<[u8; 4]> {
    let mut header = [0u8; 4];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled < header.len() {
        return Err(Error::InvalidPdf {
            reason: format!("{}: file too short", path.display()),
        });
    }
    Ok(header)
}

/// Check that a path names an existing PDF file
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    // Validate PDF header
    if !has_pdf_header(&read_header(path)?) {
        return Err(Error::InvalidPdf {
            reason: format!("{}: not a PDF file", path.display()),
        });
    }

    Ok(path.to_path_buf())
}

/// Expand the command-line inputs into a list of PDF files.
///
/// Files are checked with [`resolve_path`]. Directories contribute the
/// files matching `pattern` (default `*.pdf`, case-insensitive), descending
/// into subdirectories when `recursive` is set; each directory's files are
/// sorted by path.
pub fn resolve_inputs(
    paths: &[PathBuf],
    recursive: bool,
    pattern: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern.unwrap_or(DEFAULT_PATTERN))?;
    let mut resolved = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut files = Vec::new();
            collect_pdfs(path, recursive, &pattern, &mut files)?;
            files.sort();
            if files.is_empty() {
                warn!("No PDF files found in {}", path.display());
            }
            resolved.extend(files);
        } else {
            resolved.push(resolve_path(path)?);
        }
    }

    Ok(resolved)
}

fn collect_pdfs(
    dir: &Path,
    recursive: bool,
    pattern: &Pattern,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = std::fs::read_dir(dir)?;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let path = entry.path();

        if path.is_dir() {
            if recursive {
                if let Err(e) = collect_pdfs(&path, recursive, pattern, files) {
                    warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        } else if path.is_file() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            if !pattern.matches_with(&name, MATCH_OPTIONS) {
                continue;
            }

            match resolve_path(&path) {
                Ok(p) => files.push(p),
                Err(e) => warn!("Skipping {}", e),
            }
        }
    }

    Ok(())
}
