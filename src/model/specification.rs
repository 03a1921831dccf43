/// Query parameters for one headlines or sources request.
///
/// Built by the caller per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specification {
    pub category: String,
    pub country: String,
    pub api_key: String,
}

impl Specification {
    pub fn new(
        category: impl Into<String>,
        country: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            country: country.into(),
            api_key: api_key.into(),
        }
    }
}
