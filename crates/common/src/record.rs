use serde::{Deserialize, Serialize};

/// A node returned by similarity search, projected to the requested properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// (property name, value) pairs in request order
    pub properties: Vec<(String, String)>,

    /// Similarity score reported by the index
    pub score: f64,
}

impl Record {
    /// Create record from property pairs and score
    pub fn new(properties: Vec<(String, String)>, score: f64) -> Self {
        Self { properties, score }
    }

    /// Build a record by zipping property names with their values.
    /// Extra values without a matching name are dropped.
    pub fn from_values(names: &[String], values: Vec<String>, score: f64) -> Self {
        let properties = names.iter().cloned().zip(values).collect();
        Self { properties, score }
    }

    /// Get property value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
