pub mod net;
pub mod tensor;

use anyhow::{Result, anyhow};
use log::{debug, info, warning};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use std::ops::RangeInclusive;

/// Something that can open camera devices by index.
pub trait CaptureBackend {
    type Device: CaptureDevice;

    /// `Ok(None)` means the device exists in name only and did not open.
    fn open(&self, index: i32) -> Result<Option<Self::Device>>;
}

pub trait CaptureDevice {
    type Frame;

    fn read(&mut self) -> Result<Self::Frame>;
    fn release(&mut self) -> Result<()>;
}

/// An open camera that is released when dropped.
pub struct Capture<D: CaptureDevice> {
    index: i32,
    device: D,
}

impl<D: CaptureDevice> Capture<D> {
    pub fn open<B>(backend: &B, index: i32) -> Result<Option<Self>>
    where
        B: CaptureBackend<Device = D>,
    {
        Ok(backend
            .open(index)?
            .map(|device| Capture { index, device }))
    }

    pub fn read(&mut self) -> Result<D::Frame> {
        self.device.read()
    }
}

impl<D: CaptureDevice> Drop for Capture<D> {
    fn drop(&mut self) {
        match self.device.release() {
            Ok(()) => debug!("Camera {} released", self.index),
            Err(e) => warning!("Failed to release camera {}: {}", self.index, e),
        }
    }
}

/// Returns the first index in `candidates` that opens, or `fallback`.
pub fn select_camera_index<B: CaptureBackend>(
    backend: &B,
    candidates: RangeInclusive<i32>,
    fallback: i32,
) -> i32 {
    for index in candidates {
        debug!("Trying camera index {}", index);
        match Capture::open(backend, index) {
            Ok(Some(_opened)) => {
                info!("Using external camera {}", index);
                return index;
            }
            Ok(None) => debug!("Camera {} not available", index),
            Err(e) => debug!("Camera {} failed to open: {}", index, e),
        }
    }

    info!("No external camera found, using camera {}", fallback);
    fallback
}

/// Opens `index`, reads one frame and releases the device.
pub fn grab_frame<B: CaptureBackend>(
    backend: &B,
    index: i32,
) -> Result<Option<<B::Device as CaptureDevice>::Frame>> {
    let mut capture = match Capture::open(backend, index) {
        Ok(Some(capture)) => capture,
        Ok(None) => {
            warning!("Camera {} could not be opened", index);
            return Ok(None);
        }
        Err(e) => {
            warning!("Camera {} failed to open: {}", index, e);
            return Ok(None);
        }
    };

    let frame = capture.read()?;
    debug!("Grabbed one frame from camera {}", index);
    Ok(Some(frame))
}

pub struct OpenCvCamera;

impl CaptureBackend for OpenCvCamera {
    type Device = OpenCvDevice;

    fn open(&self, index: i32) -> Result<Option<OpenCvDevice>> {
        let mut camera = match VideoCapture::new(index, videoio::CAP_ANY) {
            Ok(camera) => camera,
            Err(e) => {
                debug!("Camera {} could not be constructed: {}", index, e);
                return Ok(None);
            }
        };

        if !camera.is_opened().unwrap_or(false) {
            if let Err(e) = camera.release() {
                warning!("Failed to release unopened camera {}: {}", index, e);
            }
            return Ok(None);
        }
        Ok(Some(OpenCvDevice { index, camera }))
    }
}

pub struct OpenCvDevice {
    index: i32,
    camera: VideoCapture,
}

impl CaptureDevice for OpenCvDevice {
    type Frame = Mat;

    fn read(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        if !self.camera.read(&mut frame)? || frame.empty() {
            return Err(anyhow!("Failed to read a frame from camera {}", self.index));
        }
        Ok(frame)
    }

    fn release(&mut self) -> Result<()> {
        self.camera.release()?;
        Ok(())
    }
}
