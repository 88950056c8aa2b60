/// Local filesystem storage for uploaded images
///
/// Files live under `<media root>/<kind>/<uuid>.<ext>`. Rows store only the
/// relative key (`blog_images/<uuid>.png`); URLs are built from the key and the
/// configured media prefix.
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use image::ImageFormat;
use mime::Mime;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Which upload directory a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    BlogImage,
    ProfilePicture,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::BlogImage, MediaKind::ProfilePicture];

    pub fn dir(&self) -> &'static str {
        match self {
            MediaKind::BlogImage => "blog_images",
            MediaKind::ProfilePicture => "profile_pics",
        }
    }

    pub fn from_dir(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.dir() == dir)
    }
}

/// Why an uploaded file was refused; shown inline on the form
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,

    #[error("The uploaded file is too large (maximum {max} bytes).")]
    TooLarge { max: usize },
}

/// Image bytes that decoded successfully
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ValidatedImage {
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }
}

fn extension_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        _ => None,
    }
}

/// Content type served for a stored file name
pub fn mime_for(name: &str) -> Option<Mime> {
    let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "webp" => "image/webp".parse().ok()?,
        _ => return None,
    };
    Some(mime)
}

/// Stored names are `<uuid>.<ext>`; anything else cannot address a file
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Check that `bytes` fully decode as a supported image
///
/// Decoding is CPU bound and runs on the blocking pool.
pub async fn inspect_image(
    bytes: Vec<u8>,
    max_bytes: usize,
) -> std::result::Result<ValidatedImage, UploadRejection> {
    if bytes.len() > max_bytes {
        return Err(UploadRejection::TooLarge { max: max_bytes });
    }

    let checked = tokio::task::spawn_blocking(move || {
        let format = image::guess_format(&bytes).ok()?;
        extension_for(format)?;
        image::load_from_memory_with_format(&bytes, format).ok()?;
        Some(ValidatedImage { bytes, format })
    })
    .await;

    match checked {
        Ok(Some(image)) => Ok(image),
        Ok(None) => Err(UploadRejection::NotAnImage),
        Err(e) => {
            warn!(error = %e, "image inspection task failed");
            Err(UploadRejection::NotAnImage)
        }
    }
}

/// Uploaded media on the local filesystem
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
    max_upload_bytes: usize,
}

impl MediaStorage {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Create every upload directory
    pub async fn ensure_dirs(&self) -> Result<()> {
        for kind in MediaKind::ALL {
            tokio::fs::create_dir_all(self.root.join(kind.dir())).await?;
        }
        Ok(())
    }

    /// Persist an image, returning its key
    pub async fn save(&self, kind: MediaKind, image: &ValidatedImage) -> Result<String> {
        let extension = extension_for(image.format)
            .ok_or_else(|| AppError::Storage(format!("unsupported format {:?}", image.format)))?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = self.root.join(kind.dir());

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &image.bytes).await?;

        let key = format!("{}/{}", kind.dir(), name);
        debug!(key = %key, bytes = image.len(), "stored upload");
        Ok(key)
    }

    /// Public URL of a stored key
    pub fn url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }

    /// Remove a stored file; failures are logged and otherwise ignored
    pub async fn remove(&self, key: &str) {
        let Some((dir, name)) = key.split_once('/') else {
            warn!(key = %key, "refusing to remove malformed media key");
            return;
        };
        if MediaKind::from_dir(dir).is_none() || !is_safe_name(name) {
            warn!(key = %key, "refusing to remove malformed media key");
            return;
        }

        match tokio::fs::remove_file(self.root.join(dir).join(name)).await {
            Ok(()) => debug!(key = %key, "removed upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(key = %key, error = %e, "failed to remove upload"),
        }
    }

    /// Bytes and content type of a stored file, `None` when absent
    pub async fn read(&self, kind: MediaKind, name: &str) -> Result<Option<(Vec<u8>, Mime)>> {
        if !is_safe_name(name) {
            return Ok(None);
        }
        let Some(mime) = mime_for(name) else {
            return Ok(None);
        };

        match tokio::fs::read(self.root.join(kind.dir()).join(name)).await {
            Ok(bytes) => Ok(Some((bytes, mime))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded(format: image::ImageOutputFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::new_rgb8(2, 2)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode image");
        bytes
    }

    fn png_bytes() -> Vec<u8> {
        encoded(image::ImageOutputFormat::Png)
    }

    fn storage_in(root: PathBuf) -> MediaStorage {
        MediaStorage::new(&MediaConfig {
            root,
            url_prefix: "/media/".to_string(),
            max_upload_bytes: 1024 * 1024,
        })
    }

    fn scratch_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("blog-service-{}-{}", label, Uuid::new_v4()))
    }

    #[test]
    fn kinds_round_trip_through_dir_names() {
        assert_eq!(MediaKind::from_dir("blog_images"), Some(MediaKind::BlogImage));
        assert_eq!(MediaKind::from_dir("profile_pics"), Some(MediaKind::ProfilePicture));
        assert_eq!(MediaKind::from_dir("etc"), None);
    }

    #[test]
    fn names_with_paths_are_unsafe() {
        assert!(is_safe_name("0f3c.png"));
        assert!(!is_safe_name("../secret.png"));
        assert!(!is_safe_name("a/b.png"));
        assert!(!is_safe_name(".hidden"));
        assert!(!is_safe_name(""));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("x.PNG"), Some(mime::IMAGE_PNG));
        assert_eq!(mime_for("x.jpeg"), Some(mime::IMAGE_JPEG));
        assert_eq!(mime_for("x.txt"), None);
        assert_eq!(mime_for("x.bmp"), None);
        assert_eq!(mime_for("x.tiff"), None);
        assert_eq!(mime_for("noext"), None);
    }

    #[tokio::test]
    async fn inspect_accepts_png_and_rejects_garbage() {
        let image = inspect_image(png_bytes(), 1024 * 1024)
            .await
            .expect("valid png");
        assert_eq!(image.format(), ImageFormat::Png);

        let rejected = inspect_image(b"definitely not an image".to_vec(), 1024).await;
        assert_eq!(rejected.unwrap_err(), UploadRejection::NotAnImage);
    }

    #[tokio::test]
    async fn decodable_formats_outside_the_allowed_set_are_rejected() {
        for format in [image::ImageOutputFormat::Bmp, image::ImageOutputFormat::Tiff] {
            let rejected = inspect_image(encoded(format), 1024 * 1024).await;
            assert_eq!(rejected.unwrap_err(), UploadRejection::NotAnImage);
        }
    }

    #[tokio::test]
    async fn inspect_rejects_oversized_uploads() {
        let rejected = inspect_image(png_bytes(), 8).await;
        assert_eq!(rejected.unwrap_err(), UploadRejection::TooLarge { max: 8 });
    }

    #[tokio::test]
    async fn save_read_and_remove() {
        let root = scratch_dir("storage");
        let storage = storage_in(root.clone());
        let image = inspect_image(png_bytes(), 1024 * 1024).await.expect("valid png");

        let key = storage
            .save(MediaKind::BlogImage, &image)
            .await
            .expect("save");
        assert!(key.starts_with("blog_images/"));
        assert!(key.ends_with(".png"));
        assert_eq!(storage.url(&key), format!("/media/{}", key));

        let name = key.trim_start_matches("blog_images/");
        let (bytes, mime) = storage
            .read(MediaKind::BlogImage, name)
            .await
            .expect("read")
            .expect("stored file");
        assert_eq!(bytes, png_bytes());
        assert_eq!(mime, mime::IMAGE_PNG);

        storage.remove(&key).await;
        assert!(storage
            .read(MediaKind::BlogImage, name)
            .await
            .expect("read")
            .is_none());

        let _ = std::fs::remove_dir_all(root);
    }
}
