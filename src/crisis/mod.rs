// Crisis screening module
// Public interface for crisis keyword detection and helpline resources

mod detector;
mod hotlines;

pub use detector::CrisisDetector;
pub use hotlines::HELPLINE_TEXT;
