/// What the frame loop should do after a surface acquisition failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame can render normally.
    Reconfigured,
    /// Transient failure; drop this frame.
    SkipFrame,
    /// Unrecoverable (out of memory); the window should close.
    Fatal,
}
