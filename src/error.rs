use std::time::Duration;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("timed out waiting for {what} after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            after,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for RenderError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RenderError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            RenderError::browser("x")
                .to_string()
                .contains("browser error:")
        );
        assert!(
            RenderError::capture("x")
                .to_string()
                .contains("capture error:")
        );
        assert!(RenderError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn timeout_names_the_gate() {
        let err = RenderError::timeout("replay loaded", Duration::from_secs(30));
        let s = err.to_string();
        assert!(s.contains("replay loaded"));
        assert!(s.contains("30s"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RenderError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
