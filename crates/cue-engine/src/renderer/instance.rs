use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// One body's world matrix as handed to a renderer.
/// Column-major, 16 floats = 64 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WorldTransform {
    pub cols: [f32; 16],
}

impl WorldTransform {
    pub const FLOATS: usize = 16;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            cols: m.to_cols_array(),
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&self.cols)
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::from_mat4(Mat4::IDENTITY)
    }
}

/// Per-frame output: one `WorldTransform` per body, in handle order.
pub struct TransformBuffer {
    pub instances: Vec<WorldTransform>,
}

impl TransformBuffer {
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: WorldTransform) {
        self.instances.push(instance);
    }

    pub fn get(&self, index: usize) -> Option<&WorldTransform> {
        self.instances.get(index)
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Raw pointer to instance data for zero-copy reads by the host.
    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }

    /// The instance data as bytes, ready for a GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for TransformBuffer {
    fn default() -> Self {
        Self::new()
    }
}
