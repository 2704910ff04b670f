pub mod compose;
pub mod context;
pub mod extraction;
pub mod merge;
pub mod outlet;
pub mod research;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;
