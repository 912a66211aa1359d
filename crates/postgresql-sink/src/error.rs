use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Cannot bind {value} to a {ty} parameter: {message}")]
    Conversion {
        ty: String,
        value: String,
        message: String,
    },

    #[error("Statement for table '{table}' expects {expected} parameters, {actual} were bound")]
    ParameterCount {
        table: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, SinkError>;
