pub mod detect;

pub use detect::{MarkerMethod, detect_classic, detect_consistent, label_profiles};
