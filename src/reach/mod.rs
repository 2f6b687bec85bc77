mod analyzer;

pub use analyzer::{ReachabilityAnalyzer, ReachableSet, method_key};
