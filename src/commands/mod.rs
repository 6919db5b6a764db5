pub mod links;
pub mod reconstruct;
pub mod status;
mod store;
pub mod tag;
pub mod targets;
#[cfg(test)]
mod tests;
