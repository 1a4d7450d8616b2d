use pv_model::{
    AtomId, Concept, ConceptId, CrossReferenceEntry, CrossReferenceIndex, RelationEdge,
    RelationType, TermType, TerminologyIndex,
};

fn atom(concept: &str, atom: &str, name: &str, vocabulary: &str, tty: &str) -> Concept {
    Concept {
        concept_id: ConceptId::new(concept).unwrap(),
        atom_id: AtomId::new(atom).unwrap(),
        display_string: name.to_string(),
        source_vocabulary: vocabulary.to_string(),
        term_type: TermType::parse(tty),
        code: String::new(),
    }
}

fn edge(from: &str, to: &str, relation: &str) -> RelationEdge {
    RelationEdge {
        from_concept: ConceptId::new(from).unwrap(),
        to_concept: ConceptId::new(to).unwrap(),
        relation_type: RelationType::parse(relation),
        source_vocabulary: "RXNORM".to_string(),
    }
}

#[test]
fn index_looks_up_atoms_by_normalized_string() {
    let index = TerminologyIndex::new(
        vec![
            atom("1191", "A2", "aspirin", "MTHSPL", "SU"),
            atom("1191", "A1", "Aspirin", "RXNORM", "IN"),
            atom("215568", "A3", "Bayer Aspirin", "RXNORM", "BN"),
        ],
        vec![],
    );
    let hits: Vec<&str> = index
        .atoms_by_string("  ASPIRIN ")
        .map(|atom| atom.atom_id.as_str())
        .collect();
    assert_eq!(hits, vec!["A1", "A2"]);
    assert_eq!(index.atom_count(), 3);
    assert_eq!(index.concept_count(), 2);
}

#[test]
fn index_deduplicates_atoms_and_edges() {
    let index = TerminologyIndex::new(
        vec![
            atom("1", "10", "x", "RXNORM", "IN"),
            atom("1", "10", "x", "RXNORM", "IN"),
        ],
        vec![
            edge("2", "1", "has_ingredient"),
            edge("2", "1", "has_ingredient"),
            edge("2", "3", "has_tradename"),
        ],
    );
    assert_eq!(index.atom_count(), 1);
    assert_eq!(index.edge_count(), 2);
    let from = ConceptId::new("2").unwrap();
    let ingredient: Vec<&RelationEdge> = index.outgoing(&from, &RelationType::INGREDIENT).collect();
    assert_eq!(ingredient.len(), 1);
    assert_eq!(ingredient[0].to_concept.as_str(), "1");
}

#[test]
fn cross_reference_lookup_normalizes_application_numbers() {
    let xref = CrossReferenceIndex::new(vec![CrossReferenceEntry {
        external_key: "NDA020998".to_string(),
        display_string: "Celebrex".to_string(),
        atom_id: AtomId::new("900").unwrap(),
    }]);
    assert_eq!(xref.by_application_number("20998").count(), 1);
    assert_eq!(xref.by_application_number("020998").count(), 1);
    assert_eq!(xref.by_application_number("99").count(), 0);
    assert_eq!(xref.by_string("CELEBREX").count(), 1);
}
