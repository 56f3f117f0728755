pub mod facility;
pub mod jobs;

pub use facility::*;
pub use jobs::*;
