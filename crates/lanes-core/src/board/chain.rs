//! In-memory column chain.
//!
//! A project's columns form a doubly linked list persisted as `prev_id` /
//! `next_id` pointers. [`ColumnChain`] mirrors that list as an arena keyed
//! by column id, so splices are O(1) and the caller learns exactly which
//! rows need rewriting.
//!
//! # Invariants
//!
//! - empty, or exactly one head (`prev = None`) and one tail (`next = None`)
//! - `a.next == Some(b)` iff `b.prev == Some(a)`
//! - walking `next` from the head visits every column exactly once

use std::collections::{HashMap, HashSet};

use crate::error::LanesError;
use crate::model::{Column, ColumnId};

/// Neighbour pointers of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Link {
    pub prev: Option<ColumnId>,
    pub next: Option<ColumnId>,
}

/// Ways a chain can be malformed or misused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("column {0} is not part of the chain")]
    Unknown(ColumnId),

    #[error("column {0} is already part of the chain")]
    Duplicate(ColumnId),

    #[error("expected exactly one head column, found {0}")]
    HeadCount(usize),

    #[error("expected exactly one tail column, found {0}")]
    TailCount(usize),

    #[error("column {from} points at {to}, which does not point back")]
    Asymmetric { from: ColumnId, to: ColumnId },

    #[error("column {from} points at {to}, which is not in this project")]
    Dangling { from: ColumnId, to: ColumnId },

    #[error("{unreached} column(s) are not reachable from the head")]
    Unreachable { unreached: usize },
}

impl From<ChainError> for LanesError {
    fn from(error: ChainError) -> Self {
        Self::CorruptChain(error.to_string())
    }
}

/// Arena of column links with head/tail cursors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnChain {
    links: HashMap<ColumnId, Link>,
    head: Option<ColumnId>,
    tail: Option<ColumnId>,
}

impl ColumnChain {
    /// Build and validate a chain from persisted pointers.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChainError`] found.
    pub fn from_links<I>(links: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = (ColumnId, Link)>,
    {
        let mut map = HashMap::new();
        for (id, link) in links {
            if map.insert(id, link).is_some() {
                return Err(ChainError::Duplicate(id));
            }
        }
        if map.is_empty() {
            return Ok(Self::default());
        }

        for (id, link) in &map {
            if let Some(next) = link.next {
                let back = map.get(&next).ok_or(ChainError::Dangling { from: *id, to: next })?;
                if back.prev != Some(*id) {
                    return Err(ChainError::Asymmetric { from: *id, to: next });
                }
            }
            if let Some(prev) = link.prev {
                let forward = map.get(&prev).ok_or(ChainError::Dangling { from: *id, to: prev })?;
                if forward.next != Some(*id) {
                    return Err(ChainError::Asymmetric { from: *id, to: prev });
                }
            }
        }

        let heads: Vec<ColumnId> = map
            .iter()
            .filter(|(_, link)| link.prev.is_none())
            .map(|(id, _)| *id)
            .collect();
        if heads.len() != 1 {
            return Err(ChainError::HeadCount(heads.len()));
        }
        let tails: Vec<ColumnId> = map
            .iter()
            .filter(|(_, link)| link.next.is_none())
            .map(|(id, _)| *id)
            .collect();
        if tails.len() != 1 {
            return Err(ChainError::TailCount(tails.len()));
        }

        let chain = Self {
            links: map,
            head: Some(heads[0]),
            tail: Some(tails[0]),
        };

        // Symmetric links with one head and one tail can still hide a
        // separate loop; a full walk from the head rules that out.
        let mut seen = HashSet::new();
        let mut cursor = chain.head;
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            cursor = chain.next(id);
        }
        if seen.len() != chain.links.len() {
            return Err(ChainError::Unreachable {
                unreached: chain.links.len() - seen.len(),
            });
        }

        Ok(chain)
    }

    /// Build from column rows.
    ///
    /// # Errors
    ///
    /// See [`ColumnChain::from_links`].
    pub fn from_columns(columns: &[Column]) -> Result<Self, ChainError> {
        Self::from_links(columns.iter().map(|c| {
            (
                c.id,
                Link {
                    prev: c.prev_id,
                    next: c.next_id,
                },
            )
        }))
    }

    #[must_use]
    pub const fn head(&self) -> Option<ColumnId> {
        self.head
    }

    #[must_use]
    pub const fn tail(&self) -> Option<ColumnId> {
        self.tail
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ColumnId) -> bool {
        self.links.contains_key(&id)
    }

    #[must_use]
    pub fn link(&self, id: ColumnId) -> Option<Link> {
        self.links.get(&id).copied()
    }

    #[must_use]
    pub fn next(&self, id: ColumnId) -> Option<ColumnId> {
        self.links.get(&id).and_then(|link| link.next)
    }

    #[must_use]
    pub fn prev(&self, id: ColumnId) -> Option<ColumnId> {
        self.links.get(&id).and_then(|link| link.prev)
    }

    /// Column ids from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = ColumnId> + '_ {
        std::iter::successors(self.head, move |id| self.next(*id))
    }

    /// Splice `id` in after `after`, or append at the tail when `after` is
    /// `None`. Returns every link that changed, the new column's included.
    ///
    /// # Errors
    ///
    /// [`ChainError::Duplicate`] if `id` is already linked,
    /// [`ChainError::Unknown`] if `after` is not.
    pub fn insert_after(
        &mut self,
        id: ColumnId,
        after: Option<ColumnId>,
    ) -> Result<Vec<(ColumnId, Link)>, ChainError> {
        if self.links.contains_key(&id) {
            return Err(ChainError::Duplicate(id));
        }
        let prev = match after {
            Some(after) if !self.links.contains_key(&after) => {
                return Err(ChainError::Unknown(after));
            }
            Some(after) => Some(after),
            None => self.tail,
        };
        let next = prev
            .and_then(|p| self.links.get(&p))
            .and_then(|link| link.next);

        let mut changed = Vec::with_capacity(3);
        self.links.insert(id, Link { prev, next });
        changed.push((id, Link { prev, next }));

        match prev {
            Some(p) => {
                let link = self.links.get_mut(&p).ok_or(ChainError::Unknown(p))?;
                link.next = Some(id);
                changed.push((p, *link));
            }
            None => self.head = Some(id),
        }
        match next {
            Some(n) => {
                let link = self.links.get_mut(&n).ok_or(ChainError::Unknown(n))?;
                link.prev = Some(id);
                changed.push((n, *link));
            }
            None => self.tail = Some(id),
        }

        Ok(changed)
    }

    /// Unlink `id`, joining its neighbours. Returns the neighbours' new
    /// links (zero, one or two entries).
    ///
    /// # Errors
    ///
    /// [`ChainError::Unknown`] if `id` is not linked.
    pub fn remove(&mut self, id: ColumnId) -> Result<Vec<(ColumnId, Link)>, ChainError> {
        let Link { prev, next } = self.links.remove(&id).ok_or(ChainError::Unknown(id))?;

        let mut changed = Vec::with_capacity(2);
        match prev {
            Some(p) => {
                let link = self.links.get_mut(&p).ok_or(ChainError::Unknown(p))?;
                link.next = next;
                changed.push((p, *link));
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                let link = self.links.get_mut(&n).ok_or(ChainError::Unknown(n))?;
                link.prev = prev;
                changed.push((n, *link));
            }
            None => self.tail = prev,
        }

        Ok(changed)
    }
}
