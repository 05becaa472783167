//! Control-frame hand-off from the wireless layer.
//!
//! The BLE stack delivers characteristic writes on its own task; the main
//! loop drains them between sensing and write-back.  A bounded static
//! channel bridges the two without heap allocation.
//!
//! ```text
//! ┌──────────────┐  ControlFrame  ┌──────────────┐
//! │  BLE write   │──────────────▶│  Main loop    │
//! │  callback    │  (depth 4)     │  (drain)      │
//! └──────────────┘                └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::Vec;
use log::warn;

/// Opcode byte plus the longest payload (a full-length device name).
pub const CONTROL_FRAME_MAX: usize = 32;

const FRAME_DEPTH: usize = 4;

/// Raw, undecoded control frame.
pub type ControlFrame = Vec<u8, CONTROL_FRAME_MAX>;

pub type FrameChannel = Channel<CriticalSectionRawMutex, ControlFrame, FRAME_DEPTH>;

/// Inbound control frames: wireless layer → main loop.
pub static CONTROL_FRAMES: FrameChannel = Channel::new();

/// Queue a frame.  Returns `false` if it was dropped (oversized or queue full).
pub fn submit(channel: &FrameChannel, bytes: &[u8]) -> bool {
    let Ok(frame) = ControlFrame::from_slice(bytes) else {
        warn!("link: dropping {}-byte control frame", bytes.len());
        return false;
    };
    match channel.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("link: control queue full, frame dropped");
            false
        }
    }
}

/// Next pending frame, if any.  Never blocks.
pub fn next_frame(channel: &FrameChannel) -> Option<ControlFrame> {
    channel.try_receive().ok()
}
