use crate::config::ConfigError;
use crate::fixtures::FixtureError;
use crate::protocol::ProtocolError;
use crate::runner::RunError;
use crate::verify::VerifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error("implementation under test failed: {0}")]
    Process(#[from] RunError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("compatibility error: {0}")]
    Verify(#[from] VerifyError),
}
