// renderer/style.rs
use std::cmp::Ordering;

use crate::renderer::pass::RenderPass;

/// An ordered list of passes drawn for every operation using the style.
#[derive(Clone, Default)]
pub struct RenderStyle {
    name: String,
    passes: Vec<RenderPass>,
}

impl RenderStyle {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            passes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a pass.  Passes in a named group are only drawn by stages
    /// rendering that group.
    pub fn create_pass(&mut self, group: &str) -> &mut RenderPass {
        self.passes.push(RenderPass::new(group));
        let index = self.passes.len() - 1;
        &mut self.passes[index]
    }

    pub fn destroy_passes(&mut self) {
        self.passes.clear();
    }

    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    pub fn pass(&self, index: usize) -> Option<&RenderPass> {
        self.passes.get(index)
    }

    pub fn pass_mut(&mut self, index: usize) -> Option<&mut RenderPass> {
        self.passes.get_mut(index)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Passes in `group`, in order.  The empty string is the default group.
    pub fn passes_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a RenderPass> {
        self.passes.iter().filter(move |pass| pass.group() == group)
    }

    pub fn is_blending(&self) -> bool {
        self.passes.iter().any(RenderPass::is_blending)
    }

    /// Draw order between styles: blending styles go after opaque ones and
    /// are otherwise unordered.
    pub fn draw_order(&self, other: &RenderStyle) -> Ordering {
        self.is_blending().cmp(&other.is_blending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::BlendFactor;

    fn blended() -> RenderStyle {
        let mut style = RenderStyle::new("glass");
        style.create_pass("");
        style
            .create_pass("")
            .set_blend_factors(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        style
    }

    #[test]
    fn any_blending_pass_makes_the_style_blending() {
        assert!(blended().is_blending());
        assert!(!RenderStyle::new("empty").is_blending());
    }

    #[test]
    fn opaque_styles_sort_first() {
        let opaque = RenderStyle::new("opaque");
        assert_eq!(opaque.draw_order(&blended()), Ordering::Less);
        assert_eq!(blended().draw_order(&opaque), Ordering::Greater);
        assert_eq!(opaque.draw_order(&opaque), Ordering::Equal);
    }

    #[test]
    fn group_filter_keeps_order() {
        let mut style = RenderStyle::new("multi");
        style.create_pass("shadow").set_line_width(1.0);
        style.create_pass("").set_line_width(2.0);
        style.create_pass("shadow").set_line_width(3.0);

        let widths: Vec<f32> = style
            .passes_in_group("shadow")
            .map(RenderPass::line_width)
            .collect();
        assert_eq!(widths, vec![1.0, 3.0]);
        assert_eq!(style.passes_in_group("").count(), 1);
    }
}
