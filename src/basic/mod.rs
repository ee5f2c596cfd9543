pub(crate) mod dsbus_dv;
pub(crate) mod newtonpf;

pub mod ecs;
pub mod solver;
pub use newtonpf::newton_pf;
