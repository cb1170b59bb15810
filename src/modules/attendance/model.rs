pub use gradebook_models::attendance::*;
