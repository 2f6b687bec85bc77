mod specialize;

pub use specialize::ensure_instantiation;
