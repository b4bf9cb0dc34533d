/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next frame can be acquired.
    Reconfigured,
    /// Transient error; drop this frame only.
    SkipFrame,
    /// Unrecoverable (out of memory); the window should close.
    Fatal,
}

impl SurfaceErrorAction {
    #[inline]
    pub fn is_fatal(self) -> bool {
        self == Self::Fatal
    }
}
