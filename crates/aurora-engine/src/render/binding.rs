//! Scoped framebuffer bindings.
//!
//! A `FramebufferBinding` opens a render pass over a set of attachments and
//! records what is bound in a `BindingState`. Pipelines declare how many of
//! the color attachments they write (the draw-buffer count); the binding
//! rejects a pipeline that writes more than is attached. Dropping the binding
//! ends the pass and restores the previous record.

use std::ops::Range;

use super::error::{RenderError, RenderResult};
use super::targets::TargetId;

/// Anything a color or depth slot can point at.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Attachment {
    Target(TargetId),
    /// The caller-provided output image (swapchain or capture texture).
    Output,
}

/// What is bound while a `FramebufferBinding` is alive.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BindingRecord {
    pub label: &'static str,
    pub colors: Vec<Attachment>,
    pub depth: Option<Attachment>,
    /// Color attachments written by the active pipeline.
    pub draw_buffers: u32,
}

/// One draw issued through a binding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DrawRecord {
    pub framebuffer: &'static str,
    pub pipeline: &'static str,
    pub draw_buffers: u32,
}

/// Bookkeeping shared by all bindings of a frame.
#[derive(Debug, Default)]
pub struct BindingState {
    current: Option<BindingRecord>,
    saved: Vec<Option<BindingRecord>>,
    bound: Vec<BindingRecord>,
    draws: Vec<DrawRecord>,
}

impl BindingState {
    pub fn current(&self) -> Option<&BindingRecord> {
        self.current.as_ref()
    }

    /// Draw-buffer count of the active binding, 0 when nothing is bound.
    pub fn draw_buffers(&self) -> u32 {
        self.current.as_ref().map_or(0, |r| r.draw_buffers)
    }

    /// Every binding opened since the last `begin_frame`, in order.
    pub fn bound(&self) -> &[BindingRecord] {
        &self.bound
    }

    /// Every draw issued since the last `begin_frame`, in order.
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn begin_frame(&mut self) {
        debug_assert!(self.current.is_none(), "binding left open across frames");
        self.bound.clear();
        self.draws.clear();
    }

    fn push(&mut self, record: BindingRecord) {
        self.bound.push(record.clone());
        let previous = self.current.replace(record);
        self.saved.push(previous);
    }

    fn pop(&mut self) {
        self.current = self.saved.pop().flatten();
    }

    fn set_draw_buffers(&mut self, count: u32) -> &'static str {
        match self.current.as_mut() {
            Some(record) => {
                record.draw_buffers = count;
                record.label
            }
            None => "<unbound>",
        }
    }
}

/// A pipeline together with the number of color attachments it writes.
pub struct PassPipeline {
    pub label: &'static str,
    pub pipeline: wgpu::RenderPipeline,
    pub draw_buffers: u32,
}

/// Color attachment request.
pub struct ColorTarget<'v> {
    pub id: Attachment,
    pub view: &'v wgpu::TextureView,
    /// Clear color, or `None` to keep existing contents.
    pub clear: Option<wgpu::Color>,
}

/// Depth attachment request, always cleared to `clear`.
pub struct DepthTarget<'v> {
    pub id: Attachment,
    pub view: &'v wgpu::TextureView,
    pub clear: f32,
}

/// Active render pass bound to a set of attachments.
pub struct FramebufferBinding<'e, 's> {
    pass: wgpu::RenderPass<'e>,
    state: &'s mut BindingState,
    attached: u32,
    active_pipeline: Option<&'static str>,
}

impl<'e, 's> FramebufferBinding<'e, 's> {
    /// Begins a render pass over `colors` (+ optional depth).
    ///
    /// The draw-buffer count starts at the number of color attachments.
    pub fn begin(
        encoder: &'e mut wgpu::CommandEncoder,
        state: &'s mut BindingState,
        label: &'static str,
        colors: &[ColorTarget<'_>],
        depth: Option<DepthTarget<'_>>,
    ) -> Self {
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = colors
            .iter()
            .map(|c| {
                Some(wgpu::RenderPassColorAttachment {
                    view: c.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: c.clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let depth_stencil_attachment =
            depth
                .as_ref()
                .map(|d| wgpu::RenderPassDepthStencilAttachment {
                    view: d.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(d.clear),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                });

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let attached = colors.len() as u32;
        state.push(BindingRecord {
            label,
            colors: colors.iter().map(|c| c.id).collect(),
            depth: depth.map(|d| d.id),
            draw_buffers: attached,
        });
        log::trace!("bound framebuffer `{label}` ({attached} color)");

        Self {
            pass,
            state,
            attached,
            active_pipeline: None,
        }
    }

    /// Activates `pipeline` and narrows the draw-buffer count to what it writes.
    pub fn use_pipeline(&mut self, pipeline: &PassPipeline) -> RenderResult<()> {
        check_draw_buffers(pipeline.label, pipeline.draw_buffers, self.attached)?;
        self.state.set_draw_buffers(pipeline.draw_buffers);
        self.pass.set_pipeline(&pipeline.pipeline);
        self.active_pipeline = Some(pipeline.label);
        Ok(())
    }

    pub fn pass(&mut self) -> &mut wgpu::RenderPass<'e> {
        &mut self.pass
    }

    /// Issues an indexed draw and logs it against the active pipeline.
    pub fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        self.record_draw();
        self.pass.draw_indexed(indices, 0, instances);
    }

    /// Draws the full-surface triangle (no vertex buffers).
    pub fn draw_fullscreen(&mut self) {
        self.record_draw();
        self.pass.draw(0..3, 0..1);
    }

    fn record_draw(&mut self) {
        let framebuffer = self.state.current().map_or("<unbound>", |r| r.label);
        let draw = DrawRecord {
            framebuffer,
            pipeline: self.active_pipeline.unwrap_or("<none>"),
            draw_buffers: self.state.draw_buffers(),
        };
        self.state.draws.push(draw);
    }
}

fn check_draw_buffers(pipeline: &'static str, writes: u32, bound: u32) -> RenderResult<()> {
    if writes > bound {
        return Err(RenderError::DrawBuffers {
            pipeline,
            writes,
            bound,
        });
    }
    Ok(())
}

impl Drop for FramebufferBinding<'_, '_> {
    fn drop(&mut self) {
        self.state.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &'static str, colors: &[Attachment], draw_buffers: u32) -> BindingRecord {
        BindingRecord {
            label,
            colors: colors.to_vec(),
            depth: None,
            draw_buffers,
        }
    }

    #[test]
    fn nested_binding_restores_previous() {
        let mut state = BindingState::default();
        state.begin_frame();
        assert_eq!(state.draw_buffers(), 0);

        let scene = [
            Attachment::Target(TargetId::HdrColor),
            Attachment::Target(TargetId::BrightColor),
        ];
        state.push(record("scene", &scene, 2));
        state.push(record("blur", &[Attachment::Target(TargetId::Blur0)], 1));
        assert_eq!(state.draw_buffers(), 1);

        state.pop();
        assert_eq!(state.current().map(|r| r.label), Some("scene"));
        assert_eq!(state.draw_buffers(), 2);

        state.pop();
        assert!(state.current().is_none());
        assert_eq!(state.bound().len(), 2);
    }

    #[test]
    fn draw_buffer_changes_stay_on_the_active_record() {
        let mut state = BindingState::default();
        state.push(record("scene", &[Attachment::Output], 2));
        assert_eq!(state.set_draw_buffers(1), "scene");
        assert_eq!(state.draw_buffers(), 1);
        // The history keeps the count the binding was opened with.
        assert_eq!(state.bound()[0].draw_buffers, 2);
        state.pop();
        assert_eq!(state.set_draw_buffers(1), "<unbound>");
    }

    #[test]
    fn pipeline_may_not_write_more_than_is_bound() {
        assert!(check_draw_buffers("emissive", 2, 2).is_ok());
        assert!(check_draw_buffers("scene lit", 1, 2).is_ok());
        match check_draw_buffers("emissive", 2, 1) {
            Err(RenderError::DrawBuffers {
                pipeline,
                writes,
                bound,
            }) => assert_eq!((pipeline, writes, bound), ("emissive", 2, 1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn begin_frame_clears_history() {
        let mut state = BindingState::default();
        state.push(record("a", &[Attachment::Output], 1));
        state.pop();
        state.begin_frame();
        assert!(state.bound().is_empty());
        assert!(state.draws().is_empty());
    }
}
