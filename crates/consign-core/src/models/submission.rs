use std::collections::HashMap;

pub const ARTWORK_TITLE: &str = "artworkTitle";
pub const ARTIST_NAME: &str = "artistName";
pub const EMAIL: &str = "email";
pub const DESIRED_PRICE: &str = "desiredPrice";
pub const MEDIUM_MATERIALS: &str = "mediumMaterials";
pub const CURRENT_LOCATION: &str = "currentLocation";
pub const AGREEMENT: &str = "agreement";
pub const COA_STATUS: &str = "coaStatus";
pub const CONSIGNOR_NAME: &str = "consignorName";
pub const PHONE: &str = "phone";
pub const DISCRETIONARY_NOTES: &str = "discretionaryNotes";

/// Multipart field carrying the primary image.
pub const FILE_FIELD: &str = "primaryImage";

/// Fields that must be present and non-empty, in the order errors are reported.
pub const REQUIRED_FIELDS: [&str; 7] = [
    ARTWORK_TITLE,
    ARTIST_NAME,
    EMAIL,
    DESIRED_PRICE,
    MEDIUM_MATERIALS,
    CURRENT_LOCATION,
    AGREEMENT,
];

/// The text fields of one consignment form post, keyed by form field name.
///
/// Unknown fields are kept; nothing here is validated. See
/// [`crate::validation::validate_submission`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    fields: HashMap<String, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. A repeated field replaces the earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, or the empty string when absent.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn artwork_title(&self) -> &str {
        self.text(ARTWORK_TITLE)
    }

    pub fn artist_name(&self) -> &str {
        self.text(ARTIST_NAME)
    }

    pub fn email(&self) -> &str {
        self.text(EMAIL)
    }

    pub fn desired_price(&self) -> &str {
        self.text(DESIRED_PRICE)
    }

    pub fn medium_materials(&self) -> &str {
        self.text(MEDIUM_MATERIALS)
    }

    pub fn current_location(&self) -> &str {
        self.text(CURRENT_LOCATION)
    }

    pub fn coa_status(&self) -> &str {
        self.text(COA_STATUS)
    }

    pub fn consignor_name(&self) -> &str {
        self.text(CONSIGNOR_NAME)
    }

    /// Phone number, `None` when absent or blank.
    pub fn phone(&self) -> Option<&str> {
        self.get(PHONE).filter(|p| !p.trim().is_empty())
    }

    pub fn discretionary_notes(&self) -> &str {
        self.text(DISCRETIONARY_NOTES)
    }
}

impl<K, V> FromIterator<(K, V)> for Submission
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut submission = Submission::new();
        for (name, value) in iter {
            submission.insert(name, value);
        }
        submission
    }
}
