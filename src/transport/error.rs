use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open port {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
