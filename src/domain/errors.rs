use derive_more::Display;
use wasm_bindgen::JsValue;

/// Simplified error system: every failure here is absorbed by the caller or
/// handed back to JavaScript as a string.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum AppError {
    #[display(fmt = "Configuration Error: {}", _0)]
    Configuration(String),
    #[display(fmt = "Rendering Error: {}", _0)]
    Rendering(String),
    #[display(fmt = "Browser API Error: {}", _0)]
    Browser(String),
}

impl std::error::Error for AppError {}

impl AppError {
    /// Wrap a JavaScript exception, keeping whatever text it carries.
    pub fn browser(context: &str, value: &JsValue) -> Self {
        AppError::Browser(format!("{}: {}", context, describe_js(value)))
    }

    pub fn rendering(context: &str, value: &JsValue) -> Self {
        AppError::Rendering(format!("{}: {}", context, describe_js(value)))
    }
}

fn describe_js(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Configuration(error.to_string())
    }
}

impl From<AppError> for JsValue {
    fn from(error: AppError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
