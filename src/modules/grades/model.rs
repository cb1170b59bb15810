pub use gradebook_grading::{AverageResult, ClassRanking, StudentReport};
pub use gradebook_models::grades::*;
