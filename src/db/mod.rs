pub mod store;

pub use store::SampleStore;
