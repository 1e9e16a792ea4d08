//! In-process frame host
//!
//! Models the pull-based scheduler that drives compositors:
//!
//! 1. **Initial phase**: [`Compositor::request_frames`] declares which input
//!    frames an output frame needs (at least one, possibly a dummy).
//! 2. **Ready phase**: once those frames are fetched,
//!    [`Compositor::produce_frame`] computes the output frame.
//!
//! [`FilterNode`] owns a compositor behind a mutex, so each instance delivers
//! frames one at a time. The most recently produced frames are kept, so the
//! overlapping requests of offset compositors downstream (frames `n, n+1`
//! then `n+1, n+2`) never run the compositor twice for the same frame.
//! Overflow statistics are reset when frame 0 is produced and summarized
//! after the last frame; both assume frames are requested in order, as
//! [`MemoryClip::render`] does.

use crate::frame::{AudioFrame, AudioInfo, Plane};
use acx_common::codec;
use acx_common::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// A stream that can be read frame by frame
pub trait AudioNode: Send + Sync {
    fn info(&self) -> &AudioInfo;

    fn get_frame(&self, n: i64) -> Result<Arc<AudioFrame>>;
}

/// Shared handle to a stream
pub type NodeRef = Arc<dyn AudioNode>;

/// Frame `frame` of input `input`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest {
    pub input: usize,
    pub frame: i64,
}

impl FrameRequest {
    pub fn new(input: usize, frame: i64) -> Self {
        Self { input, frame }
    }
}

/// Input frames fetched for one ready-phase call
#[derive(Debug, Default)]
pub struct InputFrames {
    frames: HashMap<FrameRequest, Arc<AudioFrame>>,
}

impl InputFrames {
    pub fn insert(&mut self, request: FrameRequest, frame: Arc<AudioFrame>) {
        self.frames.insert(request, frame);
    }

    /// Frame of `input`, if it was requested; `None` frame numbers yield `None`
    pub fn get(&self, input: usize, frame: Option<i64>) -> Option<&AudioFrame> {
        frame.and_then(|n| self.frames.get(&FrameRequest::new(input, n)).map(Arc::as_ref))
    }

    /// Shared handle to a requested frame, for passthrough output
    pub fn get_arc(&self, input: usize, frame: i64) -> Result<Arc<AudioFrame>> {
        self.frames
            .get(&FrameRequest::new(input, frame))
            .cloned()
            .ok_or_else(|| Error::Internal(format!("input {} frame {} was not requested", input, frame)))
    }

    /// Like [`get`](Self::get) but the frame is required
    pub fn require(&self, input: usize, frame: i64) -> Result<&AudioFrame> {
        self.get(input, Some(frame))
            .ok_or_else(|| Error::Internal(format!("input {} frame {} was not requested", input, frame)))
    }
}

/// A per-frame stream transformation
pub trait Compositor: Send {
    /// Name used as prefix of every message
    fn name(&self) -> &'static str;

    fn out_info(&self) -> &AudioInfo;

    /// Initial phase: input frames needed for output frame `n`
    fn request_frames(&self, n: i64) -> Vec<FrameRequest>;

    /// Ready phase: compute output frame `n` from the requested frames
    fn produce_frame(&mut self, n: i64, inputs: &InputFrames) -> Result<Arc<AudioFrame>>;

    /// Called before frame 0 is produced
    fn reset_overflow_stats(&mut self) {}

    /// Called after the last frame is produced
    fn log_overflow_stats(&self) {}
}

/// Produced frames kept per node; covers the two-frame lookahead of an
/// offset compositor downstream
const RECENT_FRAMES: usize = 4;

struct NodeState<C> {
    compositor: C,
    recent: VecDeque<(i64, Arc<AudioFrame>)>,
}

impl<C> NodeState<C> {
    fn cached(&self, n: i64) -> Option<Arc<AudioFrame>> {
        self.recent
            .iter()
            .find(|(frame, _)| *frame == n)
            .map(|(_, data)| Arc::clone(data))
    }

    fn remember(&mut self, n: i64, frame: &Arc<AudioFrame>) {
        if RECENT_FRAMES <= self.recent.len() {
            self.recent.pop_front();
        }
        self.recent.push_back((n, Arc::clone(frame)));
    }
}

/// Drives a compositor over its input nodes
pub struct FilterNode<C: Compositor> {
    info: AudioInfo,
    inputs: Vec<NodeRef>,
    state: Mutex<NodeState<C>>,
}

impl<C: Compositor> FilterNode<C> {
    pub fn new(compositor: C, inputs: Vec<NodeRef>) -> Self {
        debug!(
            "{}: {} samples, {} channels, {}",
            compositor.name(),
            compositor.out_info().num_samples,
            compositor.out_info().num_channels(),
            compositor.out_info().sample_type()
        );

        Self {
            info: *compositor.out_info(),
            inputs,
            state: Mutex::new(NodeState {
                compositor,
                recent: VecDeque::with_capacity(RECENT_FRAMES),
            }),
        }
    }

    /// Run `f` on the compositor, e.g. to inspect its statistics
    pub fn with_compositor<R>(&self, f: impl FnOnce(&C) -> R) -> Result<R> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("compositor lock poisoned".to_string()))?;
        Ok(f(&state.compositor))
    }
}

impl<C: Compositor + 'static> FilterNode<C> {
    pub fn into_node(self) -> NodeRef {
        Arc::new(self)
    }
}

impl<C: Compositor> AudioNode for FilterNode<C> {
    fn info(&self) -> &AudioInfo {
        &self.info
    }

    fn get_frame(&self, n: i64) -> Result<Arc<AudioFrame>> {
        if n < 0 || self.info.num_frames() <= n {
            return Err(Error::Internal(format!(
                "frame {} requested from a stream of {} frames",
                n,
                self.info.num_frames()
            )));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Internal("compositor lock poisoned".to_string()))?;

        if let Some(frame) = state.cached(n) {
            trace!("{}: frame {} served from cache", state.compositor.name(), n);
            return Ok(frame);
        }

        // initial phase
        let requests = state.compositor.request_frames(n);
        trace!("{}: frame {} requests {:?}", state.compositor.name(), n, requests);

        let mut inputs = InputFrames::default();
        for request in requests {
            let node = self.inputs.get(request.input).ok_or_else(|| {
                Error::Internal(format!("{}: no input {}", state.compositor.name(), request.input))
            })?;
            inputs.insert(request, node.get_frame(request.frame)?);
        }

        // ready phase
        if n == 0 {
            state.compositor.reset_overflow_stats();
        }

        let result = state.compositor.produce_frame(n, &inputs);

        if n == self.info.num_frames() - 1 {
            state.compositor.log_overflow_stats();
        }

        if let Ok(frame) = &result {
            state.remember(n, frame);
        }

        result
    }
}

/// A fully materialized stream
pub struct MemoryClip {
    info: AudioInfo,
    frames: Vec<Arc<AudioFrame>>,
}

impl MemoryClip {
    /// Slice full channel planes into frames
    pub fn from_planes(info: AudioInfo, planes: Vec<Plane>) -> Result<Self> {
        if planes.len() != info.num_channels() {
            return Err(Error::InvalidInput(format!(
                "{} channel planes for a {} channel stream",
                planes.len(),
                info.num_channels()
            )));
        }

        let grid = info.grid();
        let mut frames = Vec::with_capacity(info.num_frames() as usize);

        for n in 0..info.num_frames() {
            let start = grid.frame_to_first_sample(n) as usize;
            let end = start + info.frame_len(n);
            let frame_planes = planes
                .iter()
                .map(|plane| slice_plane(plane, start, end))
                .collect::<Result<Vec<_>>>()?;
            frames.push(Arc::new(AudioFrame::from_planes(info.sample_type(), frame_planes)?));
        }

        Ok(Self { info, frames })
    }

    /// Encode normalized channel data (clamped to `[-1, 1]`)
    pub fn from_normalized(info: AudioInfo, channels: &[Vec<f64>]) -> Result<Self> {
        let planes = channels
            .iter()
            .map(|samples| {
                let mut plane = Plane::zeroed(info.sample_type(), samples.len());
                for (i, &x) in samples.iter().enumerate() {
                    plane.set(i, codec::from_normalized(x, info.sample_type(), true));
                }
                plane
            })
            .collect();
        Self::from_planes(info, planes)
    }

    /// Pull every frame of `node` in order
    pub fn render(node: &dyn AudioNode) -> Result<Self> {
        let info = *node.info();
        let frames = (0..info.num_frames())
            .map(|n| node.get_frame(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { info, frames })
    }

    pub fn into_node(self) -> NodeRef {
        Arc::new(self)
    }

    pub fn frames(&self) -> &[Arc<AudioFrame>] {
        &self.frames
    }

    /// Whole channel as normalized values
    pub fn channel_normalized(&self, channel: usize) -> Vec<f64> {
        self.frames
            .iter()
            .flat_map(|frame| (0..frame.len()).map(move |i| frame.normalized(channel, i)))
            .collect()
    }

    /// Whole channel as one plane
    pub fn channel_plane(&self, channel: usize) -> Plane {
        let mut plane = Plane::zeroed(self.info.sample_type(), self.info.num_samples as usize);
        let mut pos = 0;
        for frame in &self.frames {
            for i in 0..frame.len() {
                plane.set(pos, frame.native(channel, i));
                pos += 1;
            }
        }
        plane
    }
}

impl AudioNode for MemoryClip {
    fn info(&self) -> &AudioInfo {
        &self.info
    }

    fn get_frame(&self, n: i64) -> Result<Arc<AudioFrame>> {
        usize::try_from(n)
            .ok()
            .and_then(|idx| self.frames.get(idx))
            .cloned()
            .ok_or_else(|| {
                Error::Internal(format!(
                    "frame {} requested from a stream of {} frames",
                    n,
                    self.frames.len()
                ))
            })
    }
}

fn slice_plane(plane: &Plane, start: usize, end: usize) -> Result<Plane> {
    if plane.len() < end {
        return Err(Error::InvalidInput(format!(
            "channel plane holds {} samples, stream needs {}",
            plane.len(),
            end
        )));
    }

    Ok(match plane {
        Plane::I8(v) => Plane::I8(v[start..end].to_vec()),
        Plane::I16(v) => Plane::I16(v[start..end].to_vec()),
        Plane::I32(v) => Plane::I32(v[start..end].to_vec()),
        Plane::F32(v) => Plane::F32(v[start..end].to_vec()),
        Plane::F64(v) => Plane::F64(v[start..end].to_vec()),
    })
}

/// Check that two streams can be combined sample by sample
pub fn check_same_format(func_name: &str, a: &AudioInfo, b: &AudioInfo) -> Result<()> {
    if a.format != b.format || a.sample_rate != b.sample_rate || a.frame_samples != b.frame_samples {
        return Err(Error::FormatMismatch(format!(
            "{}: clips have a different audio format ({} ch {} Hz {} vs {} ch {} Hz {})",
            func_name,
            a.num_channels(),
            a.sample_rate,
            a.sample_type(),
            b.num_channels(),
            b.sample_rate,
            b.sample_type()
        )));
    }
    Ok(())
}

/// Zero-initialized output frame for frame `n` of `info`
pub fn new_output_frame(info: &AudioInfo, n: i64) -> AudioFrame {
    AudioFrame::new(info.sample_type(), info.num_channels(), info.frame_len(n))
}
