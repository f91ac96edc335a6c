//! Behavioral diagram element tree.
//!
//! This is the in-memory shape a diagram source hands over: an ordered list
//! of messages and fragments, where fragments embed further diagrams. The
//! element kinds are a closed set, matched exhaustively by the transformer.

use serde::{Deserialize, Serialize};

use crate::node::UNCONDITIONAL;

/// A sequence diagram: a named, guarded, ordered list of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDiagram {
    pub name: String,
    /// Guard condition; for an embedded diagram this is the presence
    /// condition of the component it becomes.
    #[serde(default = "default_guard")]
    pub guard: String,
    #[serde(default)]
    pub elements: Vec<DiagramElement>,
}

fn default_guard() -> String {
    UNCONDITIONAL.to_string()
}

/// One element of a sequence diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramElement {
    Message(Message),
    Fragment(Fragment),
}

/// Kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Synchronous,
    Asynchronous,
    /// A return message; it cannot fail on its own.
    Reply,
}

/// A message between lifelines, succeeding with `probability`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    #[serde(default)]
    pub kind: MessageKind,
    pub probability: f64,
}

/// Kind of a combined fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// A single embedded diagram, present only in some products.
    Optional,
    /// Mutually exclusive branches.
    Alternative,
}

/// A combined fragment embedding one or more diagrams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub diagrams: Vec<SequenceDiagram>,
}

impl SequenceDiagram {
    /// An unconditional diagram with no elements.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guard: default_guard(),
            elements: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = guard.into();
        self
    }

    /// Append a synchronous message.
    pub fn message(self, name: impl Into<String>, probability: f64) -> Self {
        self.message_of_kind(name, MessageKind::Synchronous, probability)
    }

    pub fn message_of_kind(
        mut self,
        name: impl Into<String>,
        kind: MessageKind,
        probability: f64,
    ) -> Self {
        self.elements.push(DiagramElement::Message(Message {
            name: name.into(),
            kind,
            probability,
        }));
        self
    }

    /// Append an optional fragment wrapping `diagram`.
    pub fn optional(mut self, diagram: SequenceDiagram) -> Self {
        self.elements.push(DiagramElement::Fragment(Fragment {
            kind: FragmentKind::Optional,
            diagrams: vec![diagram],
        }));
        self
    }

    /// Append an alternative fragment with the given branches.
    pub fn alternative(mut self, branches: Vec<SequenceDiagram>) -> Self {
        self.elements.push(DiagramElement::Fragment(Fragment {
            kind: FragmentKind::Alternative,
            diagrams: branches,
        }));
        self
    }
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Optional => "optional",
            FragmentKind::Alternative => "alternative",
        }
    }
}
