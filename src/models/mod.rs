pub mod profile;
pub mod registry;

pub use profile::{DEFAULT_PORT, Profile, ProfileEdit};
pub use registry::{Registry, parse_position};
