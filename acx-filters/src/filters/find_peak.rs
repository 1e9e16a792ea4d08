//! FindPeak: measure the peak of a stream
//!
//! Not a compositor: the whole stream is read and a single number returned.

use crate::channels::ChannelSet;
use crate::host::AudioNode;
use crate::peak;
use acx_common::Result;
use tracing::debug;

const FUNC_NAME: &str = "FindPeak";

#[derive(Debug, Clone)]
pub struct FindPeakParams {
    /// Channels to scan; empty means all
    pub channels: Vec<usize>,
    /// Report the normalized magnitude instead of the signed native value
    pub normalize: bool,
}

impl Default for FindPeakParams {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            normalize: true,
        }
    }
}

/// Peak of `clip` over `params.channels`
///
/// Without normalization integer streams report the signed integer sample
/// (`-32768` for a saturated `i16` minimum), float streams the signed value.
pub fn find_peak(clip: &dyn AudioNode, params: &FindPeakParams) -> Result<f64> {
    let channels = ChannelSet::new(FUNC_NAME, &params.channels, clip.info().num_channels())?;
    let value = peak::find_peak(clip, channels.edit(), params.normalize)?;
    debug!("{}: peak {} over channels {:?}", FUNC_NAME, value, channels.edit());
    Ok(value)
}
