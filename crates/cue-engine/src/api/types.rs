/// Typed index of a body in the simulation.
///
/// Transform, rigid-body and sphere data for one ball live at the same index in
/// parallel arrays. Out-of-range handles yield `None` at the store boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

impl BodyHandle {
    /// The cue ball is always the first body of a rack.
    pub const CUE_BALL: BodyHandle = BodyHandle(0);

    /// Position of this body in the parallel arrays.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for BodyHandle {
    fn from(index: usize) -> Self {
        BodyHandle(index as u32)
    }
}

/// Which primitives a contact record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// `s0` and `s1` are both sphere indices, `s0 < s1`.
    SphereSphere,
    /// `s0` is a plane index, `s1` is a sphere index.
    PlaneSphere,
}
