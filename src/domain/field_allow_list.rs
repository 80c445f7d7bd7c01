//! The fixed set of sensor fields the gateway aggregates.

use crate::error::GatewayError;

/// Sensor fields written by the ingestion pipeline.
pub const DEFAULT_FIELDS: [&str; 6] = [
    "temperature",
    "heatindex",
    "humidity",
    "pressure",
    "light",
    "airquality",
];

/// Immutable, ordered set of recognised sensor field names.
///
/// Built once at startup and shared read-only by every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAllowList {
    fields: Vec<String>,
}

impl FieldAllowList {
    /// Builds an allow-list from field names, dropping duplicates while
    /// keeping first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if no field remains or a name is
    /// blank.
    pub fn new<I, S>(fields: I) -> Result<Self, GatewayError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field: String = field.into();
            let field = field.trim();
            if field.is_empty() {
                return Err(GatewayError::Config("blank sensor field name".to_string()));
            }
            if !unique.iter().any(|f| f == field) {
                unique.push(field.to_string());
            }
        }
        if unique.is_empty() {
            return Err(GatewayError::Config("sensor field allow-list is empty".to_string()));
        }
        Ok(Self { fields: unique })
    }

    /// Parses a comma-separated list such as `"temperature,humidity"`.
    ///
    /// # Errors
    ///
    /// See [`FieldAllowList::new`].
    pub fn from_csv(list: &str) -> Result<Self, GatewayError> {
        Self::new(list.split(','))
    }

    /// Returns `true` if `field` is allowed.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Returns the fields in configuration order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.fields
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false`; construction rejects empty lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldAllowList {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}
