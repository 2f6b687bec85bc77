mod lifter;

pub use lifter::{Lifted, MethodLifter, lift_method};
