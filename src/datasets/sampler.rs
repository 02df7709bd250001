use super::manifest::Manifest;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    Random,
    Sequential,
}

/// Manifest indices of a sampled pair. `second == first` when the first
/// frame has no usable successor in its clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePair {
    pub first: usize,
    pub second: usize,
}

impl FramePair {
    pub fn is_repeated(&self) -> bool {
        self.first == self.second
    }
}

/// Picks temporally adjacent frame pairs that never cross a clip boundary.
///
/// The last manifest entry is never used as a first frame, and is never
/// paired as a successor either.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    mode: SamplingMode,
    len: usize,
    // sequential cursor, None before the first draw
    cursor: Option<usize>,
}

impl FrameSampler {
    /// In random mode one index is drawn and discarded up front, so seeded
    /// runs advance the generator the same way the layer always has.
    pub fn new<R: Rng>(mode: SamplingMode, len: usize, rng: &mut R) -> Self {
        let mut sampler = Self {
            mode,
            len,
            cursor: None,
        };
        if mode == SamplingMode::Random && len > 0 {
            sampler.cursor = Some(rng.gen_range(0..len));
        }
        sampler
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Returns `None` when the manifest has no usable first frame (fewer
    /// than two entries).
    pub fn next_pair<R: Rng>(&mut self, manifest: &Manifest, rng: &mut R) -> Option<FramePair> {
        debug_assert_eq!(manifest.len(), self.len);
        if self.len < 2 {
            return None;
        }
        let last = self.len - 1;
        let first = loop {
            let idx = match self.mode {
                SamplingMode::Random => rng.gen_range(0..self.len),
                SamplingMode::Sequential => match self.cursor {
                    Some(c) if c + 1 < self.len => c + 1,
                    _ => 0,
                },
            };
            self.cursor = Some(idx);
            if idx != last {
                break idx;
            }
        };

        let mut second = first + 1;
        if second == last {
            second = first;
        }
        let same_clip = match (manifest.get(first), manifest.get(second)) {
            (Some(a), Some(b)) => a.clip() == b.clip(),
            _ => false,
        };
        if !same_clip {
            second = first;
        }
        Some(FramePair { first, second })
    }
}
