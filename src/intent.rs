//! Intent Classification
//!
//! Keyword and code-presence heuristic that routes a request to one of the
//! three agent actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::extract::{detect_diagram_type, extract_diagram};
use crate::syntax::DiagramType;

/// What the user wants done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Generate,
    Describe,
    Transform,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Generate => "generate",
            Intent::Describe => "describe",
            Intent::Transform => "transform",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generate" => Ok(Intent::Generate),
            "describe" => Ok(Intent::Describe),
            "transform" => Ok(Intent::Transform),
            other => Err(format!(
                "unknown action '{other}' (expected generate, describe or transform)"
            )),
        }
    }
}

/// Keyword lists, `[intent]` in the project file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    pub transform_keywords: Vec<String>,
    pub describe_keywords: Vec<String>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            transform_keywords: owned(&[
                "convert",
                "transform",
                "change to",
                "turn into",
                "into",
                "generate a c4",
                "create a c4",
            ]),
            describe_keywords: owned(&[
                "describe",
                "explain",
                "what does",
                "what is",
                "meaning",
                "analyze",
                "tell me about",
            ]),
        }
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Routes request text to an intent
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    transform_keywords: Vec<String>,
    describe_keywords: Vec<String>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(&IntentConfig::default())
    }
}

impl IntentClassifier {
    pub fn new(config: &IntentConfig) -> Self {
        Self {
            transform_keywords: lowered(&config.transform_keywords),
            describe_keywords: lowered(&config.describe_keywords),
        }
    }

    /// Classify `text`, optionally knowing the diagram type the user asked for
    ///
    /// Keywords are only looked for in the instructions around an embedded
    /// diagram, never inside the diagram itself.
    pub fn classify(&self, text: &str, target: Option<DiagramType>) -> Intent {
        let Some(code) = extract_diagram(text) else {
            log::debug!("Intent: generate (no embedded diagram)");
            return Intent::Generate;
        };

        let instructions = text.replacen(&code, "", 1).to_lowercase();
        let mentions =
            |keywords: &[String]| keywords.iter().any(|k| instructions.contains(k.as_str()));

        let intent = if mentions(&self.transform_keywords) {
            Intent::Transform
        } else if mentions(&self.describe_keywords) {
            Intent::Describe
        } else {
            let source = detect_diagram_type(&code);
            match (source, target) {
                (Some(source), Some(target)) if source != target => Intent::Transform,
                _ => Intent::Generate,
            }
        };

        log::debug!("Intent: {}", intent);
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::default()
    }

    const DIAGRAM: &str = "```mermaid\nsequenceDiagram\n  A->>B: hi\n```";

    #[test]
    fn test_no_diagram_generates() {
        let intent = classifier().classify("Explain how to draw a login flow", None);
        assert_eq!(intent, Intent::Generate);
    }

    #[test]
    fn test_transform_keyword_beats_describe_keyword() {
        let text = format!("Explain and then convert this:\n{DIAGRAM}");
        assert_eq!(classifier().classify(&text, None), Intent::Transform);
    }

    #[test]
    fn test_describe_keyword() {
        let text = format!("What does this diagram show?\n{DIAGRAM}");
        assert_eq!(classifier().classify(&text, None), Intent::Describe);
    }

    #[test]
    fn test_keywords_inside_diagram_are_ignored() {
        let text = "```mermaid\nsequenceDiagram\n  A->>B: describe the data\n```";
        assert_eq!(classifier().classify(text, None), Intent::Generate);
    }

    #[test]
    fn test_differing_target_type_transforms() {
        assert_eq!(
            classifier().classify(DIAGRAM, Some(DiagramType::Class)),
            Intent::Transform
        );
        assert_eq!(
            classifier().classify(DIAGRAM, Some(DiagramType::Sequence)),
            Intent::Generate
        );
    }

    #[test]
    fn test_default_uses_default_keywords() {
        let text = format!("Explain this\n{DIAGRAM}");
        assert_eq!(
            IntentClassifier::default().classify(&text, None),
            IntentClassifier::new(&IntentConfig::default()).classify(&text, None)
        );
        assert_eq!(IntentClassifier::default().classify(&text, None), Intent::Describe);
    }

    #[test]
    fn test_custom_keywords() {
        let config = IntentConfig {
            transform_keywords: vec!["Rewrite As".to_string()],
            describe_keywords: Vec::new(),
        };
        let text = format!("rewrite as a flowchart\n{DIAGRAM}");
        assert_eq!(
            IntentClassifier::new(&config).classify(&text, None),
            Intent::Transform
        );
    }

    #[test]
    fn test_intent_parsing() {
        assert_eq!("Describe".parse::<Intent>(), Ok(Intent::Describe));
        assert!("draw".parse::<Intent>().is_err());
        assert_eq!(Intent::Transform.to_string(), "transform");
    }
}
