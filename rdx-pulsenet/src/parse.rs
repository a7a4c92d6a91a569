//! Parses the textual network description into node declarations.
//!
//! Each non-blank line has the form `<marker><name> -> <dest>, <dest>, ...`
//! where `%` declares a toggle, `&` a coincidence node, and the bare name
//! `broadcaster` the broadcaster.

use crate::common::{NodeKind, BROADCASTER};
use std::collections::HashSet;
use thiserror::Error;

/// One declared node and its ordered destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDecl {
    pub kind: NodeKind,
    pub name: String,
    pub destinations: Vec<String>,
}

impl NodeDecl {
    pub fn new<I, S>(kind: NodeKind, name: impl Into<String>, destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            name: name.into(),
            destinations: destinations.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected `<name> -> <destinations>`")]
    MissingArrow { line: usize },
    #[error("line {line}: empty node name")]
    EmptyName { line: usize },
    #[error("line {line}: `{name}` has no type marker")]
    UnknownKind { line: usize, name: String },
    #[error("line {line}: `{name}` is declared twice")]
    DuplicateName { line: usize, name: String },
    #[error("line {line}: empty destination")]
    EmptyDestination { line: usize },
}

/// Parses a whole description, skipping blank lines.
pub fn parse_network(input: &str) -> Result<Vec<NodeDecl>, ParseError> {
    let mut seen = HashSet::new();
    let mut decls = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let decl = parse_line(line, index + 1)?;
        if !seen.insert(decl.name.clone()) {
            return Err(ParseError::DuplicateName {
                line: index + 1,
                name: decl.name,
            });
        }
        decls.push(decl);
    }
    Ok(decls)
}

fn parse_line(line: &str, number: usize) -> Result<NodeDecl, ParseError> {
    let (head, tail) = line
        .split_once("->")
        .ok_or(ParseError::MissingArrow { line: number })?;

    let head = head.trim();
    let (kind, name) = if let Some(name) = head.strip_prefix('%') {
        (NodeKind::Toggle, name)
    } else if let Some(name) = head.strip_prefix('&') {
        (NodeKind::Coincidence, name)
    } else if head == BROADCASTER {
        (NodeKind::Broadcaster, head)
    } else if head.is_empty() {
        return Err(ParseError::EmptyName { line: number });
    } else {
        return Err(ParseError::UnknownKind {
            line: number,
            name: head.to_string(),
        });
    };
    if name.is_empty() {
        return Err(ParseError::EmptyName { line: number });
    }

    let destinations = tail
        .split(',')
        .map(str::trim)
        .map(|dest| {
            if dest.is_empty() {
                Err(ParseError::EmptyDestination { line: number })
            } else {
                Ok(dest.to_string())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodeDecl {
        kind,
        name: name.to_string(),
        destinations,
    })
}
