use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Io(#[from] chmweb_util::error::ChmIoError),
}
