pub mod chunk;
pub mod flood;
pub mod growth;
pub mod health;
pub mod performance;

pub use chunk::get_flood_chunk;
pub use flood::start_flood;
pub use growth::{advance_growth, auto_growth, get_growth_mask, start_growth, stop_growth};
pub use health::hello;
pub use performance::get_performance;
