// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default fuel level per engine call (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Platform default output sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Platform default output channel count
pub const DEFAULT_CHANNELS: u16 = 2;
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 384_000;
pub const MAX_CHANNELS: u16 = 32;

/// Frames rendered per worklet quantum
pub const WORKLET_RENDER_QUANTUM: usize = 128;
/// Frames rendered per legacy callback buffer
pub const LEGACY_BUFFER_FRAMES: usize = 2048;
/// Shared ring capacity, in render quanta
pub const SHARED_RING_QUANTA: usize = 8;
/// Bounded block queue depth for message-passing transports
pub const MESSAGE_QUEUE_BLOCKS: usize = 4;
