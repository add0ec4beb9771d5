mod capture;

pub use capture::{CaptureLoader, RawFrame};
