mod draw_list;
mod lifetime;
mod spin;

pub use draw_list::{DrawCommand, DrawListSystem, DrawReport};
pub use lifetime::LifetimeSystem;
pub use spin::SpinSystem;
