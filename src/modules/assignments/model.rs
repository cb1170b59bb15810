pub use gradebook_models::assignments::*;
