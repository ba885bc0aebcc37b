//! Pure pass planning: decides which passes run and where they read and write.
//!
//! The GPU executor in [`super::Renderer`] walks the plan in order without any
//! further branching on configuration.

/// Framebuffers owned by the renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Slot {
    /// `fb0`: scene target at surface size, with depth.
    Primary,
    /// `fb1`: square effect buffer.
    AuxA,
    /// `fb2`: square effect buffer.
    AuxB,
}

/// Destination of the scene pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneTarget {
    Framebuffer(Slot),
    Backbuffer,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Pass {
    /// Visible `Scene` groups, depth tested, cleared first.
    Scene { target: SceneTarget },
    /// Effect `index` samples `source` and writes `dest`.
    Effect { index: usize, source: Slot, dest: Slot },
    /// Blends `scene` with `effects` onto the backbuffer.
    Composite { scene: Slot, effects: Slot },
    /// Visible `Overlay` groups on the backbuffer, no depth.
    Overlay,
}

/// Builds the ordered pass list for one frame.
pub fn plan_frame(effects_enabled: bool, effect_count: usize) -> Vec<Pass> {
    if !effects_enabled {
        return vec![
            Pass::Scene { target: SceneTarget::Backbuffer },
            Pass::Overlay,
        ];
    }

    let mut passes = Vec::with_capacity(effect_count + 3);
    passes.push(Pass::Scene { target: SceneTarget::Framebuffer(Slot::Primary) });

    let mut last = Slot::Primary;
    for index in 0..effect_count {
        let dest = if last == Slot::AuxA { Slot::AuxB } else { Slot::AuxA };
        passes.push(Pass::Effect { index, source: last, dest });
        last = dest;
    }

    passes.push(Pass::Composite { scene: Slot::Primary, effects: last });
    passes.push(Pass::Overlay);
    passes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_effects_render_straight_to_backbuffer() {
        let plan = plan_frame(false, 3);
        assert_eq!(
            plan,
            vec![Pass::Scene { target: SceneTarget::Backbuffer }, Pass::Overlay]
        );
    }

    #[test]
    fn empty_chain_composites_primary_with_itself() {
        let plan = plan_frame(true, 0);
        assert_eq!(
            plan,
            vec![
                Pass::Scene { target: SceneTarget::Framebuffer(Slot::Primary) },
                Pass::Composite { scene: Slot::Primary, effects: Slot::Primary },
                Pass::Overlay,
            ]
        );
    }

    #[test]
    fn effects_ping_pong_between_aux_buffers() {
        let plan = plan_frame(true, 3);
        assert_eq!(
            &plan[1..4],
            &[
                Pass::Effect { index: 0, source: Slot::Primary, dest: Slot::AuxA },
                Pass::Effect { index: 1, source: Slot::AuxA, dest: Slot::AuxB },
                Pass::Effect { index: 2, source: Slot::AuxB, dest: Slot::AuxA },
            ]
        );
        assert_eq!(plan[4], Pass::Composite { scene: Slot::Primary, effects: Slot::AuxA });
        assert_eq!(plan.last(), Some(&Pass::Overlay));
    }

    #[test]
    fn no_effect_reads_what_it_writes() {
        for n in 0..6 {
            for pass in plan_frame(true, n) {
                if let Pass::Effect { source, dest, .. } = pass {
                    assert_ne!(source, dest);
                    assert_ne!(dest, Slot::Primary);
                }
            }
        }
    }
}
