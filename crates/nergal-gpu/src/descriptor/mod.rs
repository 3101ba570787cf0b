//! Shader-visible descriptor allocation.
//!
//! A [`DescriptorHeap`] is a fixed-capacity array of view slots of one kind
//! with linear handle arithmetic (`base + slot * increment`). Heaps are
//! written during load/initialization only, never during steady-state
//! per-frame binding; at draw time a written heap is realized as a bind group
//! against a table layout from
//! [`BindingLayoutBuilder`](crate::pipeline::BindingLayoutBuilder).

mod heap;

pub use heap::{DescriptorHandle, DescriptorHeap, DescriptorKind, DescriptorView};
