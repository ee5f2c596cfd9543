pub mod result_extract;
pub mod systems;
pub mod prelude {
    pub use super::result_extract::*;
    pub use super::systems::*;
}
