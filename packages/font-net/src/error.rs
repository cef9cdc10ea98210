use font_loader::LoaderError;

#[derive(Debug)]
pub enum ProviderError {
    Io(std::io::Error),
    DataUrl(data_url::DataUrlError),
    DataUrlBase64(data_url::forgiving_base64::InvalidBase64),
    ReqwestError(reqwest::Error),
    Json(serde_json::Error),
    UnsupportedUrl(String),
}

impl From<std::io::Error> for ProviderError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<data_url::DataUrlError> for ProviderError {
    fn from(value: data_url::DataUrlError) -> Self {
        Self::DataUrl(value)
    }
}

impl From<data_url::forgiving_base64::InvalidBase64> for ProviderError {
    fn from(value: data_url::forgiving_base64::InvalidBase64) -> Self {
        Self::DataUrlBase64(value)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        Self::ReqwestError(value)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::DataUrl(e) => write!(f, "Data URL parsing error: {}", e),
            Self::DataUrlBase64(e) => write!(f, "Base64 decode error: {}", e),
            Self::ReqwestError(e) => write!(f, "HTTP request error: {}", e),
            Self::Json(e) => write!(f, "Catalog document error: {}", e),
            Self::UnsupportedUrl(url) => write!(f, "Unsupported URL: {}", url),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ReqwestError(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProviderError> for LoaderError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::ReqwestError(e) => match e.status() {
                // 4xx answers are final
                Some(status) if status.is_client_error() => {
                    LoaderError::InvalidFontData(format!("HTTP {}", status))
                }
                _ => LoaderError::Network(e.to_string()),
            },
            ProviderError::Io(e) => LoaderError::InvalidFontData(format!("I/O error: {}", e)),
            ProviderError::Json(e) => LoaderError::Catalog(e.to_string()),
            other @ (ProviderError::DataUrl(_)
            | ProviderError::DataUrlBase64(_)
            | ProviderError::UnsupportedUrl(_)) => LoaderError::InvalidUrl(other.to_string()),
        }
    }
}
