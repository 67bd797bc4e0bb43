// src/video.rs - Camera capture through nokhwa, mirrored for gesture input
use image::{imageops, DynamicImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{debug, info};

use crate::error::GestureError;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraEntry {
    pub index: u32,
    pub name: String,
}

impl CameraEntry {
    pub fn label(&self) -> String {
        format!("Camera {} ({})", self.index, self.name)
    }
}

/// Enumerates cameras visible to the native backend.
pub fn list_cameras() -> Result<Vec<CameraEntry>, GestureError> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| GestureError::Camera(e.to_string()))?;

    Ok(cameras
        .iter()
        .enumerate()
        .map(|(i, info)| CameraEntry {
            index: match info.index() {
                CameraIndex::Index(index) => *index,
                CameraIndex::String(_) => i as u32,
            },
            name: info.human_name(),
        })
        .collect())
}

pub struct VideoSource {
    camera: Camera,
    mirror: bool,
}

impl VideoSource {
    pub fn open(index: u32, mirror: bool) -> Result<Self, GestureError> {
        debug!("Opening camera index {}", index);

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| GestureError::Camera(format!("failed to open camera {}: {}", index, e)))?;
        camera
            .open_stream()
            .map_err(|e| GestureError::Camera(format!("failed to start camera {}: {}", index, e)))?;

        info!(
            "Opened camera {} ({}) at {}x{}",
            index,
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        Ok(Self { camera, mirror })
    }

    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }

    pub fn set_mirror(&mut self, mirror: bool) {
        self.mirror = mirror;
    }

    pub fn read_frame(&mut self) -> Result<DynamicImage, GestureError> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| GestureError::Camera(format!("failed to capture frame: {}", e)))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| GestureError::Camera(format!("failed to decode frame: {}", e)))?;

        let image = DynamicImage::ImageRgb8(decoded);
        Ok(if self.mirror { mirror_frame(&image) } else { image })
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

/// Flips the frame horizontally so the user sees themselves as in a mirror.
/// The default thumb rule assumes this orientation.
pub fn mirror_frame(frame: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageRgb8(imageops::flip_horizontal(&frame.to_rgb8()))
}
