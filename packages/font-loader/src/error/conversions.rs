use crate::error::types::LoaderError;

impl From<url::ParseError> for LoaderError {
    fn from(err: url::ParseError) -> Self {
        LoaderError::InvalidUrl(match err {
            url::ParseError::EmptyHost => "URL contains empty host".to_string(),
            url::ParseError::IdnaError => "Invalid international domain name".to_string(),
            url::ParseError::InvalidPort => "Invalid port number in URL".to_string(),
            url::ParseError::RelativeUrlWithoutBase => {
                "Relative URL provided without base URL".to_string()
            }
            _ => format!("URL parsing error: {:?}", err),
        })
    }
}

