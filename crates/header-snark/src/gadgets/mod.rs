mod leaf;
pub use leaf::LeafTransition;

mod aggregator;
pub use aggregator::{Aggregator, ChildProof, Wrapper};
