pub mod cookie;
mod extractors;
mod repo;

pub use extractors::UserIdentity;
