pub use gradebook_models::bulletins::*;
