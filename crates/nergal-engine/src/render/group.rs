use std::cell::RefCell;
use std::rc::Rc;

use super::ctx::{PassInfo, RenderCtx};

/// Pass a mesh group is drawn in.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RenderStage {
    /// World content: drawn with depth test, then run through the effect chain.
    #[default]
    Scene,
    /// Drawn last, straight onto the backbuffer.
    Overlay,
}

/// Anything the renderer can draw inside a pass.
pub trait MeshGroup {
    fn stage(&self) -> RenderStage;

    fn visible(&self) -> bool {
        true
    }

    /// Records draw calls into `rpass`. Pipeline state is owned by the group.
    fn render(&mut self, ctx: &RenderCtx<'_>, pass: &PassInfo<'_>, rpass: &mut wgpu::RenderPass<'_>);
}

impl<T: MeshGroup + ?Sized> MeshGroup for Rc<RefCell<T>> {
    fn stage(&self) -> RenderStage {
        self.borrow().stage()
    }

    fn visible(&self) -> bool {
        self.borrow().visible()
    }

    fn render(&mut self, ctx: &RenderCtx<'_>, pass: &PassInfo<'_>, rpass: &mut wgpu::RenderPass<'_>) {
        self.borrow_mut().render(ctx, pass, rpass);
    }
}

impl<T: MeshGroup + ?Sized> MeshGroup for Box<T> {
    fn stage(&self) -> RenderStage {
        (**self).stage()
    }

    fn visible(&self) -> bool {
        (**self).visible()
    }

    fn render(&mut self, ctx: &RenderCtx<'_>, pass: &PassInfo<'_>, rpass: &mut wgpu::RenderPass<'_>) {
        (**self).render(ctx, pass, rpass);
    }
}

/// Indices of the groups drawn in `stage`, in submission order.
pub(crate) fn groups_for_stage(groups: &[&mut dyn MeshGroup], stage: RenderStage) -> Vec<usize> {
    groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.visible() && g.stage() == stage)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        stage: RenderStage,
        visible: bool,
    }

    impl MeshGroup for Probe {
        fn stage(&self) -> RenderStage {
            self.stage
        }

        fn visible(&self) -> bool {
            self.visible
        }

        fn render(&mut self, _: &RenderCtx<'_>, _: &PassInfo<'_>, _: &mut wgpu::RenderPass<'_>) {}
    }

    #[test]
    fn selection_filters_stage_and_visibility() {
        let mut a = Probe { stage: RenderStage::Scene, visible: true };
        let mut b = Probe { stage: RenderStage::Overlay, visible: true };
        let mut c = Probe { stage: RenderStage::Scene, visible: false };
        let shared = Rc::new(RefCell::new(Probe { stage: RenderStage::Scene, visible: true }));
        let mut d = shared.clone();

        let groups: Vec<&mut dyn MeshGroup> = vec![&mut a, &mut b, &mut c, &mut d];
        assert_eq!(groups_for_stage(&groups, RenderStage::Scene), vec![0, 3]);
        assert_eq!(groups_for_stage(&groups, RenderStage::Overlay), vec![1]);

        shared.borrow_mut().visible = false;
        assert_eq!(groups_for_stage(&groups, RenderStage::Scene), vec![0]);
    }
}
