pub mod counter;

pub use counter::{CacheWindowCounter, CounterError, WindowCount, WindowCounter};
