//! Step types: one annotated location within a tour.

use serde::{Deserialize, Serialize};

/// One entry in a tour.
///
/// At most one of `file`, `directory`, `contents`, `uri`, and `view`
/// determines the step's kind. The single sanctioned pairing is
/// `contents` + `file`: an exported step carries its content inline while
/// `file` names the virtual document. `line` and `selection` apply only to
/// file-anchored steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    /// 1-based line number. Absent means the description covers the whole
    /// file and anchors to a computed fallback position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// 1-based in storage; converted at the editor boundary, never here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<StepSelection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,

    /// A regex located in the target file when no line number is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Scraped from in-code marker comments; derived, never persisted.
    #[serde(skip)]
    pub marker_title: Option<String>,

    /// Optional review verdict surfaced in step labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// The step's kind, derived once from the mutually-exclusive optional
/// fields rather than re-checked at every use site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind<'a> {
    /// Virtual in-memory content; `file` optionally names the document.
    Content {
        contents: &'a str,
        file: Option<&'a str>,
    },
    ExternalUri(&'a str),
    File(&'a str),
    Directory(&'a str),
    View(&'a str),
    /// No content field at all: the fixed "no content" sentinel.
    Placeholder,
}

/// A step that sets more than one kind field. Invalid input for the
/// resolver's dispatch; deterministically diagnosable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step sets more than one location field: {}", fields.join(", "))]
pub struct AmbiguousStep {
    pub fields: Vec<&'static str>,
}

impl Step {
    /// A virtual-content step with the given title.
    pub fn content(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            contents: Some(String::new()),
            ..Self::default()
        }
    }

    /// A file-anchored step.
    pub fn file(file: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            description: description.into(),
            ..Self::default()
        }
    }

    /// A directory-anchored step.
    pub fn directory(directory: impl Into<String>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    /// Derives the step's kind from its optional fields.
    ///
    /// Returns [`AmbiguousStep`] when more than one kind field is set,
    /// except for the `contents` + `file` pairing produced by export.
    pub fn kind(&self) -> Result<StepKind<'_>, AmbiguousStep> {
        let set: Vec<&'static str> = [
            ("file", self.file.is_some()),
            ("directory", self.directory.is_some()),
            ("contents", self.contents.is_some()),
            ("uri", self.uri.is_some()),
            ("view", self.view.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, is_set)| is_set.then_some(name))
        .collect();

        let content_with_name = set == ["file", "contents"];
        if set.len() > 1 && !content_with_name {
            return Err(AmbiguousStep { fields: set });
        }

        Ok(if let Some(contents) = &self.contents {
            StepKind::Content {
                contents,
                file: self.file.as_deref(),
            }
        } else if let Some(uri) = &self.uri {
            StepKind::ExternalUri(uri)
        } else if let Some(file) = &self.file {
            StepKind::File(file)
        } else if let Some(directory) = &self.directory {
            StepKind::Directory(directory)
        } else if let Some(view) = &self.view {
            StepKind::View(view)
        } else {
            StepKind::Placeholder
        })
    }
}

/// A selection range in storage coordinates (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSelection {
    pub start: StepPosition,
    pub end: StepPosition,
}

/// A position in storage coordinates (1-based line and character).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPosition {
    pub line: u32,
    pub character: u32,
}

/// A selection in editor coordinates (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSelection {
    pub start: EditorPosition,
    pub end: EditorPosition,
}

/// A position in editor coordinates (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorPosition {
    pub line: u32,
    pub character: u32,
}

impl StepSelection {
    /// Converts storage coordinates to the 0-based coordinates the editor
    /// boundary uses. The stored values stay 1-based.
    pub fn to_zero_based(self) -> EditorSelection {
        EditorSelection {
            start: self.start.to_zero_based(),
            end: self.end.to_zero_based(),
        }
    }

    /// Converts editor coordinates back to storage coordinates.
    #[allow(dead_code)]
    pub fn from_zero_based(selection: EditorSelection) -> Self {
        Self {
            start: StepPosition {
                line: selection.start.line + 1,
                character: selection.start.character + 1,
            },
            end: StepPosition {
                line: selection.end.line + 1,
                character: selection.end.character + 1,
            },
        }
    }
}

impl StepPosition {
    fn to_zero_based(self) -> EditorPosition {
        EditorPosition {
            line: self.line.saturating_sub(1),
            character: self.character.saturating_sub(1),
        }
    }
}
