use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb};
use log::{debug, info};

use crate::document::{PageSurface, RasterImage};
use crate::export::filename::{page_file_name, sanitize_stem};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No rendered pages to export")]
    NoPages,

    #[error("Failed to create export directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page {page} has an inconsistent pixel buffer")]
    BadRaster { page: usize },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Write every rendered page as `<stem>-page-NNN.png` into `export_dir`.
///
/// The directory is created if needed. Returns the written paths in page order.
pub fn export_pages(
    document_name: &str,
    surfaces: &[PageSurface],
    export_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    if surfaces.is_empty() {
        return Err(ExportError::NoPages);
    }

    fs::create_dir_all(export_dir).map_err(|source| ExportError::CreateDir {
        path: export_dir.to_path_buf(),
        source,
    })?;

    let stem = sanitize_stem(document_name);
    let mut written = Vec::with_capacity(surfaces.len());
    for surface in surfaces {
        let path = export_dir.join(page_file_name(&stem, surface.page()));
        write_png(surface.raster(), surface.page(), &path)?;
        debug!("Exported page {} to {path:?}", surface.page());
        written.push(path);
    }

    info!("Exported {} page(s) to {export_dir:?}", written.len());
    Ok(written)
}

fn write_png(raster: &RasterImage, page: usize, path: &Path) -> Result<(), ExportError> {
    let buffer: ImageBuffer<Rgb<u8>, &[u8]> =
        ImageBuffer::from_raw(raster.width(), raster.height(), raster.pixels())
            .ok_or(ExportError::BadRaster { page })?;

    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_one_png_per_surface() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("pages");
        let surfaces = vec![
            PageSurface::new(1, 1.0, RasterImage::blank(4, 3)),
            PageSurface::new(3, 1.0, RasterImage::blank(2, 2)),
        ];

        let written = export_pages("My: Doc.pdf", &surfaces, &out).unwrap();

        assert_eq!(
            written,
            vec![
                out.join("My_ Doc-page-001.png"),
                out.join("My_ Doc-page-003.png"),
            ]
        );
        let decoded = image::open(&written[0]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn nothing_to_export_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            export_pages("a.pdf", &[], dir.path()),
            Err(ExportError::NoPages)
        ));
    }
}
