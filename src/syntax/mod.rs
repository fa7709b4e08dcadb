//! Model of the tree emitted by the external LlamaScript parser.
//!
//! The parser serializes its concrete syntax tree as JSON: every rule node
//! carries a `children` map from rule or token name to an ordered list of
//! elements, and every token carries its source `image`. Only the fields
//! the interpreter reads are modelled; everything else is ignored.

mod lower;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use lower::{lower_expression, lower_script};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CstNode {
    #[serde(default)]
    pub name: Option<String>,
    pub children: BTreeMap<String, Vec<CstElement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CstElement {
    Node(CstNode),
    Token(CstToken),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CstToken {
    pub image: String,
    #[serde(rename = "startOffset", default)]
    pub start_offset: Option<usize>,
}

impl CstNode {
    pub fn is(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    pub fn has(&self, key: &str) -> bool {
        self.children.get(key).is_some_and(|c| !c.is_empty())
    }

    pub fn nodes<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a CstNode> + 'a {
        self.elements(key).filter_map(|e| match e {
            CstElement::Node(node) => Some(node),
            CstElement::Token(_) => None,
        })
    }

    pub fn tokens<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a CstToken> + 'a {
        self.elements(key).filter_map(|e| match e {
            CstElement::Token(token) => Some(token),
            CstElement::Node(_) => None,
        })
    }

    pub fn first_node(&self, key: &str) -> Option<&CstNode> {
        self.nodes(key).next()
    }

    pub fn first_token(&self, key: &str) -> Option<&CstToken> {
        self.tokens(key).next()
    }

    fn elements<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a CstElement> + 'a {
        self.children.get(key).into_iter().flatten()
    }
}
