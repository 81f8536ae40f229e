pub mod classification;
pub mod parsing;

pub use classification::{ClassificationService, ClassificationSummary, Prediction};
pub use parsing::{ParsedImage, ParsingService, ParsingSummary};
