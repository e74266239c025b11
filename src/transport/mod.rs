pub mod backend;
pub mod openssh;

pub use backend::{CopyOptions, Transport};
pub use openssh::OpenSshTransport;

use crate::storage::TransportConfig;

/// Create the transport described by the configuration
pub fn create_transport(config: &TransportConfig) -> Box<dyn Transport> {
    let transport = OpenSshTransport::new(&config.ssh_program, &config.scp_program);
    log::debug!(
        "Using {} transport ({}, {})",
        transport.name(),
        config.ssh_program,
        config.scp_program
    );
    Box::new(transport)
}
