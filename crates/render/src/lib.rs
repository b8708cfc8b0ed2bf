//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Everything view-dependent is derived from [`RenderView`] and the
//!   viewport size, once per frame.

mod renderer;

pub use renderer::{RenderView, Renderer, SummaryRenderer};

pub fn crate_info() -> &'static str {
    "neoleon-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
