//! Edit/copy channel partition
//!
//! Compositors only process their *edit* channels; every other channel is
//! copied from the input verbatim. An empty selection means all channels.

use acx_common::{Error, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSet {
    edit: Vec<usize>,
    copy: Vec<usize>,
}

impl ChannelSet {
    /// Validate `requested` against `num_channels` and split into edit/copy sets
    pub fn new(func_name: &str, requested: &[usize], num_channels: usize) -> Result<Self> {
        if let Some(&ch) = requested.iter().find(|&&ch| num_channels <= ch) {
            return Err(Error::InvalidInput(format!(
                "{}: invalid channel number: {}, number of channels: {}",
                func_name, ch, num_channels
            )));
        }

        let edit: Vec<usize> = if requested.is_empty() {
            (0..num_channels).collect()
        } else {
            requested.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
        };

        let copy = (0..num_channels).filter(|ch| !edit.contains(ch)).collect();

        Ok(Self { edit, copy })
    }

    /// All channels are edited
    pub fn all(num_channels: usize) -> Self {
        Self {
            edit: (0..num_channels).collect(),
            copy: Vec::new(),
        }
    }

    pub fn edit(&self) -> &[usize] {
        &self.edit
    }

    pub fn copy(&self) -> &[usize] {
        &self.copy
    }

    pub fn is_edit(&self, channel: usize) -> bool {
        self.edit.binary_search(&channel).is_ok()
    }
}
