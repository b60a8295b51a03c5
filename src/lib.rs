#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;

pub mod cluster;
pub mod contexts;
pub mod dset;
pub mod scheduler;
pub mod utils;

pub use contexts::Context;
pub use dset::DSet;
