mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{
    projection_matrix, MapLayout, Viewport, FAR_PLANE, FIELD_OF_VIEW_DEGREES, NEAR_PLANE,
};
