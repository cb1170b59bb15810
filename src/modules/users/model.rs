pub use gradebook_models::users::*;
