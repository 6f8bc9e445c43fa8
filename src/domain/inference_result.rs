/// Output of a single engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceResult {
    pub language: String,
    pub text: String,
}

impl InferenceResult {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}
