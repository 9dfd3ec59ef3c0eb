// renderer/stage.rs
//! Stages drive additional renderings of a queue, typically for a named
//! pass group such as shadows or outlines.

use crate::renderer::device::Device;
use crate::renderer::queue::RenderQueue;
use crate::renderer::renderer::Renderer;

pub trait RenderStage<D: Device> {
    /// Called once per frame before any stage renders.
    fn prepare(&mut self, _queue: &RenderQueue<'_>) {}

    fn render(&mut self, _renderer: &mut Renderer<D>, _queue: &mut RenderQueue<'_>) {}
}

/// Runs its stages in the order they were added.
pub struct RenderStageStack<D: Device> {
    stages: Vec<Box<dyn RenderStage<D>>>,
}

impl<D: Device> RenderStageStack<D> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_stage(&mut self, stage: Box<dyn RenderStage<D>>) {
        self.stages.push(stage);
    }

    pub fn destroy_stages(&mut self) {
        self.stages.clear();
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn prepare(&mut self, queue: &RenderQueue<'_>) {
        for stage in &mut self.stages {
            stage.prepare(queue);
        }
    }

    pub fn render(&mut self, renderer: &mut Renderer<D>, queue: &mut RenderQueue<'_>) {
        for stage in &mut self.stages {
            stage.render(renderer, queue);
        }
    }
}

impl<D: Device> Default for RenderStageStack<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the passes of one named group over the whole queue.
#[derive(Debug, Clone)]
pub struct GroupStage {
    group: String,
}

impl GroupStage {
    pub fn new(group: &str) -> Self {
        Self {
            group: group.to_owned(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

impl<D: Device> RenderStage<D> for GroupStage {
    fn render(&mut self, renderer: &mut Renderer<D>, queue: &mut RenderQueue<'_>) {
        queue.render_group(renderer, &self.group);
    }
}
