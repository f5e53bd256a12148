// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-backed collaborators: a still image standing in for the camera, and a
// texture sink that writes each bound texture into a directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use image::RgbaImage;
use malwerk_core::error::{MalwerkError, Result};
use malwerk_core::types::{EncodedTexture, ModelId, TextureHandle};
use tracing::{debug, info, instrument, warn};

use crate::traits::{FrameSource, TextureBinder};

/// Serves one decoded image as the "current camera frame".
pub struct StillImageSource {
    frame: RgbaImage,
}

impl StillImageSource {
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame }
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let frame = image::open(path.as_ref())
            .map_err(|err| {
                MalwerkError::ImageError(format!(
                    "failed to open {}: {}",
                    path.as_ref().display(),
                    err
                ))
            })?
            .into_rgba8();
        info!(width = frame.width(), height = frame.height(), "Still frame loaded");
        Ok(Self { frame })
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&self) -> Result<RgbaImage> {
        if self.frame.width() == 0 || self.frame.height() == 0 {
            return Err(MalwerkError::NoFrameAvailable);
        }
        Ok(self.frame.clone())
    }
}

#[derive(Debug)]
struct WrittenTexture {
    model: ModelId,
    path: PathBuf,
}

/// Writes every bound texture to `<dir>/<model>-<n>.jpg`.
///
/// Releasing a handle deletes its file, so the directory only ever holds the
/// textures that are still bound.
pub struct FileTextureSink {
    dir: PathBuf,
    next_handle: AtomicU64,
    written: Mutex<HashMap<TextureHandle, WrittenTexture>>,
}

impl FileTextureSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_handle: AtomicU64::new(1),
            written: Mutex::new(HashMap::new()),
        }
    }

    /// Path of the file backing `handle`, if it is still bound.
    pub fn path_of(&self, handle: TextureHandle) -> Option<PathBuf> {
        self.lock().get(&handle).map(|t| t.path.clone())
    }

    /// Number of textures currently on disk.
    pub fn live(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TextureHandle, WrittenTexture>> {
        self.written.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TextureBinder for FileTextureSink {
    #[instrument(skip(self, texture), fields(model = %model, bytes = texture.bytes.len()))]
    async fn bind(&self, model: &ModelId, texture: &EncodedTexture) -> Result<TextureHandle> {
        let handle = TextureHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let path = self.dir.join(format!("{}-{}.jpg", model, handle.0));

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &texture.bytes)
            .await
            .map_err(|err| {
                MalwerkError::TextureBindFailure(format!("{}: {}", path.display(), err))
            })?;

        info!(%handle, path = %path.display(), "Texture written");
        self.lock().insert(
            handle,
            WrittenTexture {
                model: model.clone(),
                path,
            },
        );
        Ok(handle)
    }

    fn release(&self, handle: TextureHandle) {
        let Some(texture) = self.lock().remove(&handle) else {
            warn!(%handle, "Release of unknown texture handle");
            return;
        };
        match std::fs::remove_file(&texture.path) {
            Ok(()) => debug!(%handle, model = %texture.model, "Texture file removed"),
            Err(e) => warn!(%handle, path = %texture.path.display(), error = %e, "Failed to remove texture file"),
        }
    }

    fn restore_original(&self, model: &ModelId) -> Result<()> {
        let stale: Vec<TextureHandle> = self
            .lock()
            .iter()
            .filter(|(_, t)| &t.model == model)
            .map(|(h, _)| *h)
            .collect();
        if !stale.is_empty() {
            warn!(%model, count = stale.len(), "Restoring model with textures still bound");
        }
        for handle in stale {
            self.release(handle);
        }
        info!(%model, "Original material restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn texture() -> EncodedTexture {
        EncodedTexture {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            mime_type: "image/jpeg",
            width: 1,
            height: 1,
            digest: String::from("00"),
        }
    }

    #[test]
    fn still_source_returns_copies() {
        let source = StillImageSource::new(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])));
        let frame = source.current_frame().expect("frame");
        assert_eq!(frame.dimensions(), (4, 3));
    }

    #[test]
    fn empty_still_has_no_frame() {
        let source = StillImageSource::new(RgbaImage::new(0, 0));
        assert!(matches!(
            source.current_frame(),
            Err(MalwerkError::NoFrameAvailable)
        ));
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = StillImageSource::open(dir.path().join("absent.png"));
        assert!(matches!(result, Err(MalwerkError::ImageError(_))));
    }

    #[tokio::test]
    async fn bind_writes_and_release_deletes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileTextureSink::new(dir.path());
        let model = ModelId::new("turtle-model");

        let handle = sink.bind(&model, &texture()).await.expect("bind");
        let path = sink.path_of(handle).expect("path");
        assert_eq!(std::fs::read(&path).expect("read"), texture().bytes);
        assert_eq!(sink.live(), 1);

        sink.release(handle);
        assert!(!path.exists());
        assert_eq!(sink.live(), 0);

        // A second release is ignored.
        sink.release(handle);
    }

    #[tokio::test]
    async fn restore_original_drops_only_that_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileTextureSink::new(dir.path());
        let turtle = ModelId::new("turtle-model");
        let goku = ModelId::new("goku-model");

        let _t = sink.bind(&turtle, &texture()).await.expect("bind");
        let g = sink.bind(&goku, &texture()).await.expect("bind");

        sink.restore_original(&turtle).expect("restore");
        assert_eq!(sink.live(), 1);
        assert!(sink.path_of(g).is_some());
    }
}
