//! Uploaded files on local disk. Each area gets its own directory under the
//! upload root and every file is stored under a random name that keeps only
//! the original extension.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const DOCUMENT_EXTS: &[&str] = &["pdf", "doc", "docx", "jpg", "png"];
pub const PAYSLIP_EXTS: &[&str] = &["pdf"];
pub const PICTURE_EXTS: &[&str] = &["jpg", "jpeg", "png"];
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif"];
pub const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "webm"];

/// Box an uploaded image is shrunk to fit, keeping its aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MaxSize {
    pub width: u32,
    pub height: u32,
}

pub const PROFILE_PICTURE_SIZE: MaxSize = MaxSize {
    width: 150,
    height: 150,
};
pub const ANNOUNCEMENT_IMAGE_SIZE: MaxSize = MaxSize {
    width: 1250,
    height: 750,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, AsRefStr)]
pub enum Area {
    #[strum(serialize = "documents")]
    Documents,
    #[strum(serialize = "profile_pics")]
    ProfilePictures,
    #[strum(serialize = "announcements")]
    Announcements,
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_bytes: usize,
}

/// Lower-cased extension of `filename`, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Strips any directory part and characters outside `[A-Za-z0-9._-]`.
/// Used for the display name kept next to a stored file.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Decodes an image, shrinks it into `max` if needed and re-encodes it in the
/// format named by `ext`.
fn shrink_image(data: &[u8], ext: &str, max: MaxSize) -> AppResult<Vec<u8>> {
    let format = ImageFormat::from_extension(ext)
        .ok_or_else(|| AppError::validation(format!("Unsupported image type: {ext}")))?;
    let img = image::load_from_memory(data)
        .map_err(|_| AppError::validation("Uploaded file is not a valid image"))?;

    let img = if img.width() > max.width || img.height() > max.height {
        img.thumbnail(max.width, max.height)
    } else {
        img
    };
    // JPEG has no alpha channel
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .map_err(|e| AppError::Internal(format!("Failed to encode image: {e}")))?;
    Ok(buf.into_inner())
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn path_of(&self, area: Area, stored_name: &str) -> PathBuf {
        self.root.join(area.as_ref()).join(stored_name)
    }

    /// Extension of `original_name` once the upload passes the size and type
    /// checks.
    fn accept(&self, original_name: &str, allowed_exts: &[&str], bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::validation(format!(
                "Uploaded file exceeds {} bytes",
                self.max_bytes
            )));
        }
        extension_of(original_name)
            .filter(|e| allowed_exts.contains(&e.as_str()))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "File type not allowed; expected one of: {}",
                    allowed_exts.join(", ")
                ))
            })
    }

    async fn write(&self, area: Area, ext: &str, bytes: &[u8]) -> AppResult<String> {
        let dir = self.root.join(area.as_ref());
        tokio::fs::create_dir_all(&dir).await?;

        let stored_name = format!("{}.{}", Uuid::new_v4().to_simple(), ext);
        tokio::fs::write(dir.join(&stored_name), bytes).await?;

        tracing::debug!(area = %area, stored_name = %stored_name, size = bytes.len(), "Stored upload");
        Ok(stored_name)
    }

    /// Writes `bytes` and returns the generated stored name.
    pub async fn save(
        &self,
        area: Area,
        original_name: &str,
        allowed_exts: &[&str],
        bytes: &[u8],
    ) -> AppResult<String> {
        let ext = self.accept(original_name, allowed_exts, bytes)?;
        self.write(area, &ext, bytes).await
    }

    /// Like [`save`](Self::save), but the bytes must decode as an image. Images
    /// larger than `max` are scaled down to fit before they are written.
    pub async fn save_image(
        &self,
        area: Area,
        original_name: &str,
        allowed_exts: &[&str],
        bytes: &[u8],
        max: MaxSize,
    ) -> AppResult<String> {
        let ext = self.accept(original_name, allowed_exts, bytes)?;

        let data = bytes.to_vec();
        let format_ext = ext.clone();
        let resized = tokio::task::spawn_blocking(move || shrink_image(&data, &format_ext, max))
            .await
            .map_err(|e| AppError::Internal(format!("image task failed: {e}")))??;

        self.write(area, &ext, &resized).await
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, area: Area, stored_name: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.path_of(area, stored_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Encoded solid-colour image for upload tests.
#[cfg(test)]
pub(crate) fn sample_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([30, 120, 200]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lower_cased() {
        assert_eq!(extension_of("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
    }

    #[test]
    fn sanitize_drops_directories_and_odd_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my file.pdf"), "my_file.pdf");
        assert_eq!(sanitize_filename(".."), "file");
    }

    #[actix_web::test]
    async fn saves_under_area_with_random_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 16);

        let name = storage
            .save(Area::Documents, "Contract.PDF", DOCUMENT_EXTS, b"%PDF-1.4")
            .await
            .unwrap();
        assert!(name.ends_with(".pdf"));
        assert_ne!(name, "Contract.pdf");

        let path = dir.path().join("documents").join(&name);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");

        storage.remove(Area::Documents, &name).await.unwrap();
        assert!(!path.exists());
        storage.remove(Area::Documents, &name).await.unwrap();
    }

    #[actix_web::test]
    async fn rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 4);

        let empty = storage.save(Area::Documents, "a.pdf", PAYSLIP_EXTS, b"").await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let large = storage.save(Area::Documents, "a.pdf", PAYSLIP_EXTS, b"12345").await;
        assert!(matches!(large, Err(AppError::Validation(_))));

        let wrong = storage.save(Area::ProfilePictures, "a.gif", PICTURE_EXTS, b"GIF").await;
        assert!(matches!(wrong, Err(AppError::Validation(_))));
    }

    #[actix_web::test]
    async fn large_images_are_shrunk_to_fit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024 * 1024);

        let upload = sample_image(600, 300, ImageFormat::Png);
        let name = storage
            .save_image(Area::ProfilePictures, "me.png", PICTURE_EXTS, &upload, PROFILE_PICTURE_SIZE)
            .await
            .unwrap();
        let stored = image::open(storage.path_of(Area::ProfilePictures, &name)).unwrap();
        assert_eq!((stored.width(), stored.height()), (150, 75));

        let small = sample_image(40, 20, ImageFormat::Jpeg);
        let name = storage
            .save_image(Area::Announcements, "tiny.jpg", IMAGE_EXTS, &small, ANNOUNCEMENT_IMAGE_SIZE)
            .await
            .unwrap();
        let stored = image::open(storage.path_of(Area::Announcements, &name)).unwrap();
        assert_eq!((stored.width(), stored.height()), (40, 20));
    }

    #[actix_web::test]
    async fn image_uploads_must_decode() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);

        let junk = storage
            .save_image(Area::ProfilePictures, "me.png", PICTURE_EXTS, b"not a png", PROFILE_PICTURE_SIZE)
            .await;
        assert!(matches!(junk, Err(AppError::Validation(_))));
        assert!(!dir.path().join("profile_pics").exists());
    }
}
