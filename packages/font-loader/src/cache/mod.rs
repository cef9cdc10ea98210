mod binary;
mod stylesheet;

pub use binary::{BinaryCache, BinaryCacheEntry, BinaryCacheStats};
pub use stylesheet::{
    ResourceHandle, StylesheetResourceTracker, StylesheetTracker, SweepPolicy, TrackerInfo,
};
