//! Binding layouts and pipeline configurations.
//!
//! Both follow the same shape: a mutable builder accumulates declarative
//! state, `build` produces an immutable object that is validated once and
//! shared across many draw calls. Parameter order on the binding-layout
//! builder is semantically significant — it defines the group index draw-time
//! bindings must reference.

mod binding;
mod builder;
mod library;

pub use binding::{
    BindingLayout, BindingLayoutBuilder, BindingParam, SamplerDesc, ShaderVisibility,
};
pub use builder::{
    DepthStencilDesc, PipelineBuilder, PipelineConfiguration, RasterizerDesc, VertexLayout,
};
pub use library::PipelineLibrary;
