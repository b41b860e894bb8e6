pub mod addr;
pub mod error;
pub mod hook;
pub mod msg;
pub mod net;
pub mod node;
pub mod proto;
pub mod sim;
pub mod topo;

pub use error::SimError;

#[cfg(test)]
mod test;
