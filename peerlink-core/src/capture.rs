//! Capture device enumeration, capability negotiation, and video sources
//!
//! The system's capture subsystem is reached through the [`CaptureDriver`]
//! and [`CaptureModule`] traits, mirroring the engine's device-info /
//! capture-module object model. Device opening binds to the calling
//! thread's identity in the underlying engine, so every open is routed
//! through the [`EngineWorker`] gateway.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::frame::VideoFrame;
use crate::types::{CaptureCapability, DeviceDescriptor, VideoDeviceConfiguration, FOURCC_ANY};
use crate::worker::EngineWorker;

/// Consumer of produced video frames
pub trait FrameSink: Send + Sync {
    /// Deliver one frame; invoked synchronously on the producing thread
    fn on_frame(&self, frame: &VideoFrame);
}

/// Fan-out of one frame stream to any number of sinks
///
/// Sinks added after creation receive every frame produced after the add;
/// removing a sink stops delivery to it without affecting the others.
#[derive(Default)]
pub struct FrameBroadcaster {
    sinks: Mutex<Vec<Arc<dyn FrameSink>>>,
}

impl FrameBroadcaster {
    /// Create an empty broadcaster
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink
    pub fn add_sink(&self, sink: Arc<dyn FrameSink>) {
        self.sinks.lock().push(sink);
    }

    /// Detach a previously attached sink
    pub fn remove_sink(&self, sink: &Arc<dyn FrameSink>) {
        self.sinks
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, sink));
    }

    /// Number of currently attached sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.lock().len()
    }
}

impl FrameSink for FrameBroadcaster {
    fn on_frame(&self, frame: &VideoFrame) {
        // Snapshot so a sink may detach itself from inside the callback
        let sinks = self.sinks.lock().clone();
        for sink in sinks {
            sink.on_frame(frame);
        }
    }
}

/// Access to the system's capture device list
///
/// Implementations must guarantee that at most one capture session is
/// active per device: opening a device that is already open fails with
/// `InvalidOperation` rather than creating a second module.
pub trait CaptureDriver: Send + Sync {
    /// One-shot snapshot of the current system device list
    fn devices(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Supported capture modes of one device, in the system's order
    fn capabilities(&self, device_id: &str) -> Result<Vec<CaptureCapability>>;

    /// Open `device_id` in the given mode
    fn open(
        &self,
        device_id: &str,
        capability: &CaptureCapability,
    ) -> Result<Box<dyn CaptureModule>>;
}

/// An opened capture device
pub trait CaptureModule: Send {
    /// Begin producing frames into `sink`
    fn start(&mut self, capability: &CaptureCapability, sink: Arc<dyn FrameSink>) -> Result<()>;

    /// Stop producing frames; idempotent
    fn stop(&mut self);
}

/// Enumerate the system's capture devices
///
/// Re-queries the system on every call; the returned snapshot is not kept
/// in sync with hot-plug events.
pub fn enumerate_devices(driver: &dyn CaptureDriver) -> Result<Vec<DeviceDescriptor>> {
    driver.devices()
}

/// Enumerate the capture modes of one device
///
/// Modes whose pixel format has no four-character-code mapping are
/// filtered out. An unknown device id yields an empty list, not an error,
/// matching the enumeration contract.
pub fn enumerate_capabilities(
    driver: &dyn CaptureDriver,
    device_id: &str,
) -> Result<Vec<CaptureCapability>> {
    let capabilities = match driver.capabilities(device_id) {
        Ok(capabilities) => capabilities,
        Err(Error::NotFound(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    Ok(capabilities
        .into_iter()
        .filter(|capability| capability.pixel_format.to_fourcc() != FOURCC_ANY)
        .collect())
}

enum SourceInner {
    /// Backed by an opened capture device
    Device {
        module: Box<dyn CaptureModule>,
        capability: CaptureCapability,
    },
    /// Fed by an external producer through [`VideoSource::push_frame`]
    External,
    /// Device stopped and released
    Closed,
}

/// A live source of video frames, device-backed or externally fed
///
/// Sources start producing frames as soon as they are created; engine
/// sources start live by convention. Frames fan out to every attached
/// sink.
pub struct VideoSource {
    broadcaster: Arc<FrameBroadcaster>,
    inner: Mutex<SourceInner>,
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource").finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Create a source fed by the caller instead of a capture device
    pub fn external() -> Arc<Self> {
        Arc::new(Self {
            broadcaster: Arc::new(FrameBroadcaster::new()),
            inner: Mutex::new(SourceInner::External),
        })
    }

    /// The capability the device was opened with, if device-backed
    pub fn capability(&self) -> Option<CaptureCapability> {
        match &*self.inner.lock() {
            SourceInner::Device { capability, .. } => Some(*capability),
            _ => None,
        }
    }

    /// Attach a frame consumer; frames produced after the add are delivered
    pub fn add_sink(&self, sink: Arc<dyn FrameSink>) {
        self.broadcaster.add_sink(sink);
    }

    /// Detach a frame consumer
    pub fn remove_sink(&self, sink: &Arc<dyn FrameSink>) {
        self.broadcaster.remove_sink(sink);
    }

    /// Number of attached consumers
    pub fn sink_count(&self) -> usize {
        self.broadcaster.sink_count()
    }

    /// Push one frame into an externally fed source
    ///
    /// # Errors
    ///
    /// `InvalidOperation` on device-backed or closed sources.
    pub fn push_frame(&self, frame: &VideoFrame) -> Result<()> {
        match &*self.inner.lock() {
            SourceInner::External => {}
            _ => {
                return Err(Error::InvalidOperation(
                    "push_frame on a non-external source".into(),
                ))
            }
        }
        self.broadcaster.on_frame(frame);
        Ok(())
    }

    /// Stop the underlying device, if any; idempotent
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if let SourceInner::Device { module, .. } = &mut *inner {
            module.stop();
            *inner = SourceInner::Closed;
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open a video source matching `config`
///
/// Selection is deterministic for a given device snapshot and filter:
///
/// 1. A non-empty `device_id` must match exactly one system device, else
///    `NotFound`; otherwise all devices are candidates (`NotFound` when
///    the system has none).
/// 2. With any width/height/framerate constraint, candidate capability
///    lists are scanned in enumeration order and the first exact match of
///    every constrained field is opened.
/// 3. Without constraints, the first candidate device is opened with its
///    first enumerated capability.
/// 4. When no candidate could be opened, the call fails with
///    `InvalidOperation` (distinct from `NotFound` above).
///
/// The entire selection and open runs on the designated engine thread; on
/// success the returned source is already producing frames.
pub fn open_video_source(
    driver: Arc<dyn CaptureDriver>,
    worker: &EngineWorker,
    config: &VideoDeviceConfiguration,
) -> Result<Arc<VideoSource>> {
    let config = config.clone();
    worker.invoke(move || open_on_engine_thread(&*driver, &config))?
}

fn open_on_engine_thread(
    driver: &dyn CaptureDriver,
    config: &VideoDeviceConfiguration,
) -> Result<Arc<VideoSource>> {
    let devices = driver.devices()?;

    let candidates: Vec<DeviceDescriptor> = if config.device_id.is_empty() {
        devices
    } else {
        match devices.into_iter().find(|d| d.id == config.device_id) {
            Some(device) => vec![device],
            None => {
                tracing::warn!(device_id = %config.device_id, "video capture device not found");
                return Err(Error::NotFound(format!(
                    "video capture device {}",
                    config.device_id
                )));
            }
        }
    };
    if candidates.is_empty() {
        return Err(Error::NotFound("no video capture device".into()));
    }

    let mut opened: Option<(Box<dyn CaptureModule>, CaptureCapability)> = None;
    if config.has_capability_constraint() {
        'devices: for device in &candidates {
            for capability in driver.capabilities(&device.id)? {
                if !config.matches(&capability) {
                    continue;
                }
                match driver.open(&device.id, &capability) {
                    Ok(module) => {
                        opened = Some((module, capability));
                        break 'devices;
                    }
                    Err(err) => {
                        tracing::debug!(device_id = %device.id, %err, "capture open failed");
                    }
                }
            }
        }
    } else {
        for device in &candidates {
            let capabilities = driver.capabilities(&device.id)?;
            let Some(capability) = capabilities.first().copied() else {
                continue;
            };
            match driver.open(&device.id, &capability) {
                Ok(module) => {
                    opened = Some((module, capability));
                    break;
                }
                Err(err) => {
                    tracing::debug!(device_id = %device.id, %err, "capture open failed");
                }
            }
        }
    }

    let Some((mut module, capability)) = opened else {
        tracing::warn!(
            candidates = candidates.len(),
            "no video capture device could be opened"
        );
        return Err(Error::InvalidOperation(
            "no video capture device could be opened".into(),
        ));
    };

    // The broadcaster must exist before start so no early frame is lost;
    // a start failure drops the module without returning a half-built
    // source.
    let broadcaster = Arc::new(FrameBroadcaster::new());
    module.start(&capability, Arc::clone(&broadcaster) as Arc<dyn FrameSink>)?;

    tracing::debug!(
        width = capability.width,
        height = capability.height,
        framerate = capability.max_framerate,
        "video capture started"
    );
    Ok(Arc::new(VideoSource {
        broadcaster,
        inner: Mutex::new(SourceInner::Device { module, capability }),
    }))
}
