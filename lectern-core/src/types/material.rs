//! Course materials: the read-only corpus the engine ranks.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of course material.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MaterialType {
    /// Lecture notes or transcripts.
    Lecture,
    /// Slide decks.
    Slides,
    /// Homework or project handouts.
    Assignment,
    /// Assigned readings.
    Reading,
    /// Lab instructions.
    Lab,
    /// Past exams and solutions.
    Exam,
    /// Anything else.
    #[default]
    Other,
}

/// A single piece of course material.
///
/// Materials are owned by the host platform; the engine only reads them and
/// shares them behind `Arc` once indexed.
///
/// # Examples
///
/// ```rust
/// use lectern_core::types::{Material, MaterialType};
///
/// let material = Material::new("m1", "cs101", "Binary Search", "Halve the interval each step.")
///     .with_type(MaterialType::Lecture)
///     .with_keywords(["search", "algorithms"]);
///
/// assert_eq!(material.keywords.len(), 2);
/// assert!(material.searchable_text().contains("Binary Search"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Stable identifier, unique within a corpus.
    pub id: String,

    /// Course the material belongs to.
    pub course_id: String,

    /// Human readable title.
    pub title: String,

    /// Kind of material.
    #[serde(rename = "type", default)]
    pub material_type: MaterialType,

    /// Full text content.
    pub content: String,

    /// Instructor supplied keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Material {
    /// Create a new material with no keywords and type `Other`.
    pub fn new<I, C, T, B>(id: I, course_id: C, title: T, content: B) -> Self
    where
        I: Into<String>,
        C: Into<String>,
        T: Into<String>,
        B: Into<String>,
    {
        Self {
            id: id.into(),
            course_id: course_id.into(),
            title: title.into(),
            material_type: MaterialType::Other,
            content: content.into(),
            keywords: Vec::new(),
        }
    }

    /// Set the material type.
    #[must_use]
    pub fn with_type(mut self, material_type: MaterialType) -> Self {
        self.material_type = material_type;
        self
    }

    /// Set the keyword list.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Text used for both lexical indexing and embedding: title, content and
    /// keywords separated by newlines.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.content.len() + self.keywords.len() * 12 + 2,
        );
        text.push_str(&self.title);
        text.push('\n');
        text.push_str(&self.content);
        if !self.keywords.is_empty() {
            text.push('\n');
            text.push_str(&self.keywords.join(" "));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_material_type_parsing() {
        assert_eq!(MaterialType::from_str("Lecture").unwrap(), MaterialType::Lecture);
        assert_eq!(MaterialType::Slides.to_string(), "slides");
    }

    #[test]
    fn test_material_deserializes_type_field() {
        let json = r#"{
            "id": "m1",
            "course_id": "cs101",
            "title": "Recursion",
            "type": "reading",
            "content": "A function that calls itself."
        }"#;
        let material: Material = serde_json::from_str(json).unwrap();
        assert_eq!(material.material_type, MaterialType::Reading);
        assert!(material.keywords.is_empty());
    }

    #[test]
    fn test_searchable_text_without_keywords() {
        let material = Material::new("m1", "c", "Title", "Body");
        assert_eq!(material.searchable_text(), "Title\nBody");
    }
}
