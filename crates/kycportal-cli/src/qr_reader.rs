//! QR code reader using camera capture.
//!
//! Uses nokhwa for cross-platform camera access and rqrr for QR decoding.
//! Capture runs on a background thread; callers subscribe to a stream of
//! detection batches and stop it by dropping or unsubscribing the handle.

use crate::decoder::decode_all_luma;
use nokhwa::Camera;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Consecutive frame failures tolerated before reporting a camera fault.
const MAX_FRAME_FAILURES: u32 = 50;

/// Frames without any code before the view counts as cleared.
const CLEAR_AFTER_EMPTY_FRAMES: u32 = 10;

/// One QR symbol decoded from a camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSymbol {
    pub raw_value: String,
}

/// Event emitted by a camera subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// Symbols decoded from one frame. Never empty.
    Detected(Vec<DetectedSymbol>),
    /// No code has been seen for a while after one was in view.
    Cleared,
    /// Hardware or permission fault.
    Error(String),
}

/// Camera used in scan mode.
#[derive(Debug, Clone)]
pub struct CameraSource {
    index: u32,
    frame_interval: Duration,
}

impl CameraSource {
    pub fn new(index: u32, frame_interval: Duration) -> Self {
        Self {
            index,
            frame_interval,
        }
    }

    /// Open the camera and start delivering detection batches.
    ///
    /// The stream ends when the returned [`Subscription`] is dropped or
    /// unsubscribed, or when the camera cannot be opened (after an
    /// [`CameraEvent::Error`]).
    pub fn subscribe(&self) -> (Subscription, UnboundedReceiver<CameraEvent>) {
        let (event_tx, event_rx) = unbounded_channel();
        let (stop_tx, stop_rx) = mpsc::channel();
        let index = self.index;
        let frame_interval = self.frame_interval;

        thread::spawn(move || {
            if let Err(e) = camera_capture_loop(index, frame_interval, &event_tx, stop_rx) {
                let _ = event_tx.send(CameraEvent::Error(e));
            }
        });

        (
            Subscription {
                stop_tx,
                active: true,
            },
            event_rx,
        )
    }
}

/// Handle of a running camera capture.
pub struct Subscription {
    stop_tx: mpsc::Sender<()>,
    active: bool,
}

impl Subscription {
    /// Stop capture and release the camera.
    pub fn unsubscribe(&mut self) {
        if self.active {
            let _ = self.stop_tx.send(());
            self.active = false;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn open_camera(index: u32) -> Result<Camera, String> {
    // Higher resolution helps detection; fall back to whatever the device offers.
    let formats_to_try = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            Resolution::new(1280, 720),
            FrameFormat::MJPEG,
            30,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            Resolution::new(1280, 720),
            FrameFormat::YUYV,
            30,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            Resolution::new(640, 480),
            FrameFormat::MJPEG,
            30,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ];

    let mut last_error = String::new();
    for (i, requested) in formats_to_try.iter().enumerate() {
        tracing::debug!("Trying camera format {}/{}", i + 1, formats_to_try.len());
        match Camera::new(CameraIndex::Index(index), *requested) {
            Ok(camera) => return Ok(camera),
            Err(e) => {
                last_error = e.to_string();
                tracing::warn!("Camera format {} failed: {}", i + 1, e);
            }
        }
    }

    Err(format!(
        "Failed to open camera {} with any format. Last error: {}. \
         Check that this application has camera permission.",
        index, last_error
    ))
}

/// Background camera capture loop.
fn camera_capture_loop(
    index: u32,
    frame_interval: Duration,
    event_tx: &UnboundedSender<CameraEvent>,
    stop_rx: mpsc::Receiver<()>,
) -> Result<(), String> {
    tracing::info!("Starting camera {} for QR scanning", index);

    let mut camera = open_camera(index)?;
    camera
        .open_stream()
        .map_err(|e| format!("Failed to start camera stream: {}", e))?;

    tracing::info!(
        "Camera opened: {} at {:?}",
        camera.info().human_name(),
        camera.resolution()
    );

    let mut failures = 0u32;
    let mut empty_frames = 0u32;
    let mut code_in_view = false;
    loop {
        if !matches!(stop_rx.try_recv(), Err(mpsc::TryRecvError::Empty)) {
            tracing::info!("Camera subscription stopped");
            break;
        }

        let frame = camera
            .frame()
            .map_err(|e| e.to_string())
            .and_then(|f| f.decode_image::<RgbFormat>().map_err(|e| e.to_string()));
        let decoded = match frame {
            Ok(img) => {
                failures = 0;
                img
            }
            Err(e) => {
                failures += 1;
                tracing::warn!("Frame capture error: {}", e);
                if failures >= MAX_FRAME_FAILURES {
                    let _ = camera.stop_stream();
                    return Err(format!("Camera stopped delivering frames: {}", e));
                }
                thread::sleep(Duration::from_millis(100));
                continue;
            }
        };

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;
        let luma: Vec<u8> = decoded
            .into_raw()
            .chunks_exact(3)
            .map(|px| ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8)
            .collect();

        let symbols = decode_all_luma(width, height, &luma);
        if symbols.is_empty() {
            empty_frames = empty_frames.saturating_add(1);
            if code_in_view && empty_frames >= CLEAR_AFTER_EMPTY_FRAMES {
                code_in_view = false;
                if event_tx.send(CameraEvent::Cleared).is_err() {
                    break;
                }
            }
        } else {
            empty_frames = 0;
            code_in_view = true;
            let batch = symbols
                .into_iter()
                .map(|raw_value| DetectedSymbol { raw_value })
                .collect();
            if event_tx.send(CameraEvent::Detected(batch)).is_err() {
                // Receiver dropped.
                break;
            }
        }

        thread::sleep(frame_interval);
    }

    let _ = camera.stop_stream();
    tracing::info!("Camera capture loop ended");
    Ok(())
}
