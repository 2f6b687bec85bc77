mod collector;

pub use collector::collect;
