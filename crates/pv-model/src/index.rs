//! Read-only lookup structures over the terminology graph.

use std::collections::HashMap;

use crate::ids::{AtomId, ConceptId};
use crate::lookup::{normalize_application_number, normalize_key};
use crate::terminology::{Concept, CrossReferenceEntry, RelationEdge, RelationType};

/// Terminology graph index: atoms by normalized string, by atom id and by
/// concept id, plus outgoing edges by concept.
///
/// Atoms are stored sorted by `(concept_id, atom_id)` so every lookup returns
/// them in the same order regardless of load order.
#[derive(Debug, Clone, Default)]
pub struct TerminologyIndex {
    atoms: Vec<Concept>,
    by_atom: HashMap<AtomId, usize>,
    by_string: HashMap<String, Vec<usize>>,
    by_concept: HashMap<ConceptId, Vec<usize>>,
    outgoing: HashMap<ConceptId, Vec<RelationEdge>>,
    edge_count: usize,
}

impl TerminologyIndex {
    pub fn new(mut atoms: Vec<Concept>, edges: Vec<RelationEdge>) -> Self {
        atoms.sort_by(|a, b| {
            a.concept_id
                .cmp(&b.concept_id)
                .then_with(|| a.atom_id.cmp(&b.atom_id))
        });
        atoms.dedup_by(|a, b| a.atom_id == b.atom_id);

        let mut by_atom = HashMap::with_capacity(atoms.len());
        let mut by_string: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_concept: HashMap<ConceptId, Vec<usize>> = HashMap::new();
        for (idx, atom) in atoms.iter().enumerate() {
            by_atom.entry(atom.atom_id.clone()).or_insert(idx);
            let key = normalize_key(&atom.display_string);
            if !key.is_empty() {
                by_string.entry(key).or_default().push(idx);
            }
            by_concept
                .entry(atom.concept_id.clone())
                .or_default()
                .push(idx);
        }

        let mut outgoing: HashMap<ConceptId, Vec<RelationEdge>> = HashMap::new();
        let mut edge_count = 0usize;
        for edge in edges {
            let list = outgoing.entry(edge.from_concept.clone()).or_default();
            if list.contains(&edge) {
                continue;
            }
            list.push(edge);
            edge_count += 1;
        }
        for list in outgoing.values_mut() {
            list.sort_by(|a, b| {
                a.to_concept
                    .cmp(&b.to_concept)
                    .then_with(|| a.relation_type.as_str().cmp(b.relation_type.as_str()))
            });
        }

        Self {
            atoms,
            by_atom,
            by_string,
            by_concept,
            outgoing,
            edge_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn concept_count(&self) -> usize {
        self.by_concept.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn atom(&self, atom_id: &AtomId) -> Option<&Concept> {
        self.by_atom.get(atom_id).map(|idx| &self.atoms[*idx])
    }

    /// Atoms whose display string matches `value` after key normalization.
    pub fn atoms_by_string<'a>(
        &'a self,
        value: &str,
    ) -> impl Iterator<Item = &'a Concept> + use<'a> {
        let key = normalize_key(value);
        self.by_string
            .get(&key)
            .into_iter()
            .flatten()
            .map(move |idx| &self.atoms[*idx])
    }

    pub fn atoms_of_concept<'a>(
        &'a self,
        concept_id: &ConceptId,
    ) -> impl Iterator<Item = &'a Concept> + use<'a> {
        self.by_concept
            .get(concept_id)
            .into_iter()
            .flatten()
            .map(move |idx| &self.atoms[*idx])
    }

    /// Outgoing edges of `concept_id` whose relation is one of `relations`.
    pub fn outgoing<'a>(
        &'a self,
        concept_id: &ConceptId,
        relations: &'a [RelationType],
    ) -> impl Iterator<Item = &'a RelationEdge> + use<'a> {
        self.outgoing
            .get(concept_id)
            .into_iter()
            .flatten()
            .filter(move |edge| relations.contains(&edge.relation_type))
    }
}

/// Cross-reference lookup by normalized application number and by
/// normalized product string.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceIndex {
    entries: Vec<CrossReferenceEntry>,
    by_key: HashMap<String, Vec<usize>>,
    by_string: HashMap<String, Vec<usize>>,
}

impl CrossReferenceIndex {
    pub fn new(mut entries: Vec<CrossReferenceEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.external_key
                .cmp(&b.external_key)
                .then_with(|| a.atom_id.cmp(&b.atom_id))
        });
        entries.dedup();
        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_string: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if let Some(key) = normalize_application_number(&entry.external_key) {
                by_key.entry(key).or_default().push(idx);
            }
            let key = normalize_key(&entry.display_string);
            if !key.is_empty() {
                by_string.entry(key).or_default().push(idx);
            }
        }
        Self {
            entries,
            by_key,
            by_string,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn by_application_number<'a>(
        &'a self,
        application_number: &str,
    ) -> impl Iterator<Item = &'a CrossReferenceEntry> + use<'a> {
        normalize_application_number(application_number)
            .and_then(|key| self.by_key.get(&key))
            .into_iter()
            .flatten()
            .map(move |idx| &self.entries[*idx])
    }

    pub fn by_string<'a>(
        &'a self,
        value: &str,
    ) -> impl Iterator<Item = &'a CrossReferenceEntry> + use<'a> {
        self.by_string
            .get(&normalize_key(value))
            .into_iter()
            .flatten()
            .map(move |idx| &self.entries[*idx])
    }
}
