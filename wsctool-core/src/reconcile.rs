use tracing::{debug, warn};

use crate::speaker::{encode_record, infer_kind};
use crate::transcript::Entry;

/// Result of a reconstruction pass: the container bytes plus whether the
/// original offsets had to be abandoned.
#[derive(Debug, Clone)]
pub struct ReconstructOutcome {
    pub data: Vec<u8>,
    pub recalculated: bool,
}

fn regenerate_binary(entry: &mut Entry) -> usize {
    let binary = encode_record(&infer_kind(&entry.content, entry.is_speaker));
    let len = binary.len();
    entry.binary_data = Some(binary);
    len
}

/// Try to keep every entry's original offsets.
///
/// Every entry is re-encoded; if each binary is exactly
/// `original_length + 1` bytes (content plus terminator) the original
/// absolute addressing still holds and offsets stay untouched. A single
/// mismatch invalidates every subsequent absolute offset, so preservation
/// is all-or-nothing: the caller falls back to full recalculation.
pub fn try_preserve_offsets(entries: &mut [Entry]) -> bool {
    for entry in entries.iter_mut() {
        let actual = regenerate_binary(entry);
        let expected = entry.original_length + 1;
        if actual != expected {
            debug!(
                start = entry.start_offset,
                expected, actual, "entry length changed, offsets cannot be preserved"
            );
            return false;
        }
    }
    true
}

/// Reassign all offsets sequentially from zero, in entry order.
pub fn recalculate_offsets(entries: &mut [Entry]) {
    let mut running = 0usize;
    for entry in entries.iter_mut() {
        let len = regenerate_binary(entry);
        entry.start_offset = running;
        // end_offset is the terminator position, one before the next
        // record's start.
        entry.end_offset = running + len - 1;
        running += len;
    }
}

/// Reconstruct the container from entries, preserving original offsets when
/// requested and possible.
pub fn reconstruct(entries: &mut [Entry], preserve_offsets: bool) -> ReconstructOutcome {
    let recalculated = if preserve_offsets {
        if try_preserve_offsets(entries) {
            false
        } else {
            warn!("entry lengths changed, recalculating all offsets");
            recalculate_offsets(entries);
            true
        }
    } else {
        recalculate_offsets(entries);
        true
    };

    let mut data = Vec::new();
    for entry in entries.iter() {
        if let Some(binary) = &entry.binary_data {
            data.extend_from_slice(binary);
        }
    }

    ReconstructOutcome { data, recalculated }
}
