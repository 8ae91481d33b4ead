//! Entity Component System integration with hecs.

pub mod components;

pub mod prelude {
    pub use super::components::*;
}
