//! Reference table loaders.
//!
//! Concept and relation files are read as RRF when the extension is `.rrf`
//! and as headered CSV otherwise. Rows that cannot produce a graph element
//! are skipped and counted, never fatal.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use pv_model::{
    AtomId, Concept, ConceptId, CrossReferenceEntry, CrossReferenceIndex, ManualOverrideEntry,
    RelationEdge, RelationType, TermType, TerminologyIndex,
};

use crate::csv_utils::{Row, get_field, is_rrf, read_csv_rows, read_rrf_records, require_columns};
use crate::error::TerminologyError;
use crate::rrf::{parse_conso, parse_rel};

/// Rows produced by a loader together with the number of skipped rows.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Loaded<T> {
    fn from_parts(items: Vec<T>, skipped: usize, what: &str, path: &Path) -> Self {
        info!(path = %path.display(), loaded = items.len(), skipped, "loaded {what}");
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "skipped unusable {what} rows");
        }
        Self { items, skipped }
    }
}

/// Load terminology atoms from `RXNCONSO.RRF` or a concepts CSV.
pub fn load_concepts(path: &Path) -> Result<Loaded<Concept>> {
    let mut items = Vec::new();
    let mut skipped = 0usize;
    if is_rrf(path) {
        for record in read_rrf_records(path)? {
            match parse_conso(&record) {
                Ok(atom) => items.push(atom),
                Err(_) => skipped += 1,
            }
        }
    } else {
        let rows = read_csv_rows(path)?;
        require_columns(
            path,
            &rows,
            &["concept_id", "atom_id", "display_string", "source_vocabulary", "term_type"],
        )?;
        for row in &rows {
            match concept_from_row(row) {
                Some(atom) => items.push(atom),
                None => skipped += 1,
            }
        }
    }
    Ok(Loaded::from_parts(items, skipped, "concepts", path))
}

fn concept_from_row(row: &Row) -> Option<Concept> {
    Some(Concept {
        concept_id: ConceptId::new(get_field(row, "concept_id")).ok()?,
        atom_id: AtomId::new(get_field(row, "atom_id")).ok()?,
        display_string: get_field(row, "display_string"),
        source_vocabulary: get_field(row, "source_vocabulary"),
        term_type: TermType::parse(&get_field(row, "term_type")),
        code: get_field(row, "code"),
    })
}

/// Load relation edges from `RXNREL.RRF` or a relations CSV.
pub fn load_relations(path: &Path) -> Result<Loaded<RelationEdge>> {
    let mut items = Vec::new();
    let mut skipped = 0usize;
    if is_rrf(path) {
        for record in read_rrf_records(path)? {
            match parse_rel(&record) {
                Ok(edge) => items.push(edge),
                Err(_) => skipped += 1,
            }
        }
    } else {
        let rows = read_csv_rows(path)?;
        require_columns(path, &rows, &["from_concept", "to_concept", "relation_type"])?;
        for row in &rows {
            match relation_from_row(row) {
                Some(edge) => items.push(edge),
                None => skipped += 1,
            }
        }
    }
    Ok(Loaded::from_parts(items, skipped, "relations", path))
}

fn relation_from_row(row: &Row) -> Option<RelationEdge> {
    let relation = get_field(row, "relation_type");
    if relation.is_empty() {
        return None;
    }
    Some(RelationEdge {
        from_concept: ConceptId::new(get_field(row, "from_concept")).ok()?,
        to_concept: ConceptId::new(get_field(row, "to_concept")).ok()?,
        relation_type: RelationType::parse(&relation),
        source_vocabulary: get_field(row, "source_vocabulary"),
    })
}

/// Load the application-number cross-reference CSV.
pub fn load_cross_references(path: &Path) -> Result<Loaded<CrossReferenceEntry>> {
    let rows = read_csv_rows(path)?;
    require_columns(path, &rows, &["external_key", "atom_id"])?;
    let mut items = Vec::new();
    let mut skipped = 0usize;
    for row in &rows {
        let external_key = get_field(row, "external_key");
        let display_string = get_field(row, "display_string");
        match AtomId::new(get_field(row, "atom_id")) {
            Ok(atom_id) if !(external_key.is_empty() && display_string.is_empty()) => {
                items.push(CrossReferenceEntry {
                    external_key,
                    display_string,
                    atom_id,
                });
            }
            _ => skipped += 1,
        }
    }
    Ok(Loaded::from_parts(items, skipped, "cross references", path))
}

/// Load curated manual overrides.
pub fn load_manual_overrides(path: &Path) -> Result<Loaded<ManualOverrideEntry>> {
    let rows = read_csv_rows(path)?;
    require_columns(path, &rows, &["source_string", "final_concept_id"])?;
    let mut items = Vec::new();
    let mut skipped = 0usize;
    for row in &rows {
        let source_string = get_field(row, "source_string");
        match ConceptId::new(get_field(row, "final_concept_id")) {
            Ok(final_concept_id) if !source_string.is_empty() => {
                items.push(ManualOverrideEntry {
                    source_string,
                    source_vocabulary: get_field(row, "source_vocabulary"),
                    source_term_type: get_field(row, "source_term_type"),
                    final_concept_id,
                });
            }
            _ => skipped += 1,
        }
    }
    Ok(Loaded::from_parts(items, skipped, "manual overrides", path))
}

/// Load atoms and edges and build the terminology index.
///
/// An atom file without usable rows is an error: nothing can be resolved
/// against an empty graph.
pub fn load_terminology(concepts: &Path, relations: Option<&Path>) -> Result<TerminologyIndex> {
    let atoms = load_concepts(concepts)
        .with_context(|| format!("load concepts: {}", concepts.display()))?;
    if atoms.items.is_empty() {
        return Err(TerminologyError::Empty {
            path: concepts.to_path_buf(),
        }
        .into());
    }
    let edges = match relations {
        Some(path) => {
            load_relations(path)
                .with_context(|| format!("load relations: {}", path.display()))?
                .items
        }
        None => Vec::new(),
    };
    let index = TerminologyIndex::new(atoms.items, edges);
    info!(
        atoms = index.atom_count(),
        concepts = index.concept_count(),
        edges = index.edge_count(),
        "terminology index built"
    );
    Ok(index)
}

/// Load the cross-reference file and build its index.
pub fn load_cross_reference_index(path: &Path) -> Result<CrossReferenceIndex> {
    let entries = load_cross_references(path)
        .with_context(|| format!("load cross references: {}", path.display()))?;
    Ok(CrossReferenceIndex::new(entries.items))
}
