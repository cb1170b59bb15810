pub use gradebook_models::auth::*;
