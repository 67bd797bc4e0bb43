// Opens every camera the native backend reports and grabs one frame from each.
use anyhow::Result;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{error, info};

fn probe(index: CameraIndex) -> Result<(u32, u32)> {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = Camera::new(index, format)?;
    camera.open_stream()?;
    let frame = camera.frame()?;
    let image = frame.decode_image::<RgbFormat>()?;
    camera.stop_stream()?;
    Ok((image.width(), image.height()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cameras = nokhwa::query(ApiBackend::Auto)?;
    if cameras.is_empty() {
        error!("No camera found. Check that one is connected and that camera permissions are granted.");
        return Ok(());
    }

    for info in &cameras {
        match probe(info.index().clone()) {
            Ok((width, height)) => info!("{} ({}): frame {}x{}", info.index(), info.human_name(), width, height),
            Err(e) => error!("{} ({}): {}", info.index(), info.human_name(), e),
        }
    }

    Ok(())
}
