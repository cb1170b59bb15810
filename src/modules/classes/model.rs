pub use gradebook_models::classes::*;
