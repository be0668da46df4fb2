//! TeamGraph: the ordered, append-only log of links for one team.
//!
//! A graph always starts with a root link at seq 1. Each subsequent link
//! names its predecessor by id, so the whole history is hash-chained.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::link::Link;
use crate::types::LinkId;
use crate::validation::{validate_link, validate_successor};

/// Serialized form of a graph.
#[derive(Serialize, Deserialize)]
struct GraphWire {
    team_name: String,
    links: Vec<Link>,
}

/// The signed history of one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamGraph {
    team_name: String,
    links: Vec<Link>,
    /// Cached ids, parallel to `links`.
    ids: Vec<LinkId>,
}

impl TeamGraph {
    /// Start a new graph from its root link.
    pub fn new(team_name: impl Into<String>, root: Link) -> Result<Self, ValidationError> {
        validate_link(&root)?;
        validate_successor(0, None, &root)?;

        let id = root.compute_id();
        Ok(Self {
            team_name: team_name.into(),
            links: vec![root],
            ids: vec![id],
        })
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    /// The root link (seq 1).
    pub fn root(&self) -> &Link {
        &self.links[0]
    }

    /// The most recent link.
    pub fn head(&self) -> &Link {
        &self.links[self.links.len() - 1]
    }

    pub fn head_id(&self) -> LinkId {
        self.ids[self.ids.len() - 1]
    }

    /// Number of links (always at least 1).
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false: a graph cannot exist without its root.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The seq the next appended link must carry.
    pub fn next_seq(&self) -> u64 {
        self.links.len() as u64 + 1
    }

    /// Append a link to the head.
    ///
    /// The graph is unchanged if the link is rejected.
    pub fn append(&mut self, link: Link) -> Result<LinkId, ValidationError> {
        validate_link(&link)?;
        validate_successor(self.links.len() as u64, Some(self.head_id()), &link)?;

        let id = link.compute_id();
        self.links.push(link);
        self.ids.push(id);
        Ok(id)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Iterate over links together with their ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.ids.iter().copied().zip(self.links.iter())
    }

    /// Re-validate every link and the hash chain between them.
    pub fn verify(&self) -> Result<(), ValidationError> {
        if self.links.is_empty() {
            return Err(ValidationError::MissingRoot);
        }

        let mut prev: Option<LinkId> = None;
        for (i, link) in self.links.iter().enumerate() {
            validate_link(link)?;
            validate_successor(i as u64, prev, link)?;
            prev = Some(link.compute_id());
        }
        Ok(())
    }

    /// Encode the graph as CBOR.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let wire = GraphWire {
            team_name: self.team_name.clone(),
            links: self.links.clone(),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&wire, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode and verify a graph produced by [`TeamGraph::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let wire: GraphWire =
            ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

        let graph = Self {
            ids: wire.links.iter().map(Link::compute_id).collect(),
            team_name: wire.team_name,
            links: wire.links,
        };
        graph.verify()?;
        Ok(graph)
    }
}
