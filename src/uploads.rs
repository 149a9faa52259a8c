use crate::assembler::{DashboardPipeline, DashboardResponse};
use crate::error::Result;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

pub const NO_WORKBOOK_MESSAGE: &str =
    "Nenhum arquivo Excel encontrado na pasta uploads. Faça upload de uma planilha primeiro.";

/// True for `.xlsx`/`.xls` file names, ignoring case.
pub fn is_supported_workbook(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Most recently modified supported workbook directly inside `dir`.
/// Ties on modification time go to the lexically greater file name.
pub fn latest_workbook(dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_supported_workbook(&path) {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let newer = match &latest {
            Some((best_time, best_path)) => {
                (modified, &path) > (*best_time, best_path)
            }
            None => true,
        };
        if newer {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Processes the newest workbook in the upload directory. An empty
/// directory, or one that cannot be read, is a failure response.
pub fn process_latest_upload(dir: impl AsRef<Path>, pipeline: &DashboardPipeline) -> DashboardResponse {
    let dir = dir.as_ref();
    match latest_workbook(dir) {
        Ok(Some(path)) => {
            info!("Loading most recent upload: {}", path.display());
            pipeline.process_path(path)
        }
        Ok(None) => {
            warn!("No workbook found in {}", dir.display());
            DashboardResponse::failure(NO_WORKBOOK_MESSAGE)
        }
        Err(err) => {
            warn!("Unable to scan {}: {}", dir.display(), err);
            DashboardResponse::failure(err.to_string())
        }
    }
}
