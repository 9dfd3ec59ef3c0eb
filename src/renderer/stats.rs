// renderer/stats.rs
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use wgpu::PrimitiveTopology;

pub const DEFAULT_STATS_WINDOW: usize = 60;

/// Counters for a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub operation_count: u32,
    pub pass_count: u32,
    pub vertex_count: u32,
    pub point_count: u32,
    pub line_count: u32,
    pub triangle_count: u32,
    pub duration: Duration,
}

impl FrameStats {
    /// Records one draw of `vertex_count` vertices.
    pub fn add_primitives(&mut self, topology: PrimitiveTopology, vertex_count: u32) {
        self.vertex_count += vertex_count;
        match topology {
            PrimitiveTopology::PointList => self.point_count += vertex_count,
            PrimitiveTopology::LineList => self.line_count += vertex_count / 2,
            PrimitiveTopology::LineStrip => self.line_count += vertex_count.saturating_sub(1),
            PrimitiveTopology::TriangleList => self.triangle_count += vertex_count / 3,
            PrimitiveTopology::TriangleStrip => {
                self.triangle_count += vertex_count.saturating_sub(2)
            }
        }
    }
}

/// Rolling per-frame statistics.  The newest frame is the one currently
/// being recorded.
#[derive(Debug)]
pub struct RenderStats {
    frames: VecDeque<FrameStats>,
    window: usize,
    frame_count: u64,
    frame_rate: f32,
    frame_started: Instant,
    texture_count: u32,
    program_count: u32,
}

impl RenderStats {
    pub fn new(window: usize) -> Self {
        let mut frames = VecDeque::with_capacity(window + 1);
        frames.push_front(FrameStats::default());
        Self {
            frames,
            window: window.max(1),
            frame_count: 0,
            frame_rate: 0.0,
            frame_started: Instant::now(),
            texture_count: 0,
            program_count: 0,
        }
    }

    /// Closes the current frame and starts recording a new one.
    pub fn add_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.frame_started);
        self.frame_started = now;
        self.push_frame(elapsed);
    }

    fn push_frame(&mut self, elapsed: Duration) {
        self.frame_count += 1;

        if let Some(current) = self.frames.front_mut() {
            current.duration = elapsed;
        }

        let total: f32 = self
            .frames
            .iter()
            .map(|frame| frame.duration.as_secs_f32())
            .sum();
        self.frame_rate = if total > 0.0 {
            self.frames.len() as f32 / total
        } else {
            0.0
        };

        self.frames.push_front(FrameStats::default());
        self.frames.truncate(self.window);
    }

    pub(crate) fn current_mut(&mut self) -> &mut FrameStats {
        if self.frames.is_empty() {
            self.frames.push_front(FrameStats::default());
        }
        &mut self.frames[0]
    }

    pub(crate) fn add_operation(&mut self) {
        self.current_mut().operation_count += 1;
    }

    pub(crate) fn add_pass(&mut self) {
        self.current_mut().pass_count += 1;
    }

    pub(crate) fn add_primitives(&mut self, topology: PrimitiveTopology, vertex_count: u32) {
        self.current_mut().add_primitives(topology, vertex_count);
    }

    pub(crate) fn add_texture(&mut self) {
        self.texture_count += 1;
    }

    pub(crate) fn add_program(&mut self) {
        self.program_count += 1;
    }

    /// Stats of the frame being recorded.
    pub fn current(&self) -> FrameStats {
        self.frames.front().copied().unwrap_or_default()
    }

    /// Completed frames, newest first.
    pub fn completed(&self) -> impl Iterator<Item = &FrameStats> {
        self.frames.iter().skip(1)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the retained window.
    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn texture_count(&self) -> u32 {
        self.texture_count
    }

    pub fn program_count(&self) -> u32 {
        self.program_count
    }
}

impl Default for RenderStats {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_WINDOW)
    }
}
