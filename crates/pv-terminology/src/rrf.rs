//! RxNorm Rich Release Format rows.
//!
//! `RXNCONSO.RRF` columns:
//! `RXCUI|LAT|TS|LUI|STT|SUI|ISPREF|RXAUI|SAUI|SCUI|SDUI|SAB|TTY|CODE|STR|SRL|SUPPRESS|CVF|`
//!
//! `RXNREL.RRF` columns:
//! `RXCUI1|RXAUI1|STYPE1|REL|RXCUI2|RXAUI2|STYPE2|RELA|RUI|SRUI|SAB|SL|DIR|RG|SUPPRESS|CVF|`

use csv::StringRecord;

use pv_model::{AtomId, Concept, ConceptId, RelationEdge, RelationType, TermType};

use crate::csv_utils::rrf_field;

mod conso {
    pub const RXCUI: usize = 0;
    pub const LAT: usize = 1;
    pub const RXAUI: usize = 7;
    pub const SAB: usize = 11;
    pub const TTY: usize = 12;
    pub const CODE: usize = 13;
    pub const STR: usize = 14;
    pub const SUPPRESS: usize = 16;
}

mod rel {
    pub const RXCUI1: usize = 0;
    pub const REL: usize = 3;
    pub const RXCUI2: usize = 4;
    pub const RELA: usize = 7;
    pub const SAB: usize = 10;
}

/// Suppressibility flags of atoms that are not loaded (obsolete, suppressed
/// by the source or by the editors).
const SUPPRESSED: [&str; 3] = ["O", "Y", "E"];

/// Why an RRF row did not produce a graph element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RrfSkip {
    NonEnglish,
    Suppressed,
    MissingIdentifier,
}

/// Parse one `RXNCONSO.RRF` row.
pub fn parse_conso(record: &StringRecord) -> Result<Concept, RrfSkip> {
    let language = rrf_field(record, conso::LAT);
    if !language.is_empty() && !language.eq_ignore_ascii_case("ENG") {
        return Err(RrfSkip::NonEnglish);
    }
    if SUPPRESSED.contains(&rrf_field(record, conso::SUPPRESS)) {
        return Err(RrfSkip::Suppressed);
    }
    let concept_id =
        ConceptId::new(rrf_field(record, conso::RXCUI)).map_err(|_| RrfSkip::MissingIdentifier)?;
    let atom_id =
        AtomId::new(rrf_field(record, conso::RXAUI)).map_err(|_| RrfSkip::MissingIdentifier)?;
    Ok(Concept {
        concept_id,
        atom_id,
        display_string: rrf_field(record, conso::STR).to_string(),
        source_vocabulary: rrf_field(record, conso::SAB).to_string(),
        term_type: TermType::parse(rrf_field(record, conso::TTY)),
        code: rrf_field(record, conso::CODE).to_string(),
    })
}

/// Parse one `RXNREL.RRF` row as `RXCUI2 --RELA--> RXCUI1`.
///
/// Atom-level relations (no concept ids) are skipped. `REL` stands in when
/// `RELA` is blank.
pub fn parse_rel(record: &StringRecord) -> Result<RelationEdge, RrfSkip> {
    let from_concept =
        ConceptId::new(rrf_field(record, rel::RXCUI2)).map_err(|_| RrfSkip::MissingIdentifier)?;
    let to_concept =
        ConceptId::new(rrf_field(record, rel::RXCUI1)).map_err(|_| RrfSkip::MissingIdentifier)?;
    let label = match rrf_field(record, rel::RELA) {
        "" => rrf_field(record, rel::REL),
        rela => rela,
    };
    Ok(RelationEdge {
        from_concept,
        to_concept,
        relation_type: RelationType::parse(label),
        source_vocabulary: rrf_field(record, rel::SAB).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> StringRecord {
        StringRecord::from(line.split('|').collect::<Vec<_>>())
    }

    #[test]
    fn conso_row_becomes_atom() {
        let row = record(
            "1191|ENG||L0001|PF|S0001|Y|2095551||||RXNORM|IN|1191|aspirin||N|4096|",
        );
        let atom = parse_conso(&row).unwrap();
        assert_eq!(atom.concept_id.as_str(), "1191");
        assert_eq!(atom.atom_id.as_str(), "2095551");
        assert_eq!(atom.source_vocabulary, "RXNORM");
        assert_eq!(atom.term_type, TermType::Ingredient);
        assert_eq!(atom.display_string, "aspirin");
    }

    #[test]
    fn conso_skips_suppressed_and_foreign_rows() {
        let suppressed =
            record("1191|ENG||||||2095552||||RXNORM|SY|1191|asa||O||");
        assert_eq!(parse_conso(&suppressed), Err(RrfSkip::Suppressed));
        let spanish = record("1191|SPA||||||2095553||||MSHSPA|MH|D001241|aspirina||N||");
        assert_eq!(parse_conso(&spanish), Err(RrfSkip::NonEnglish));
    }

    #[test]
    fn rel_row_reads_second_concept_first() {
        let row = record("1191|||RO|315431|||ingredient_of|R1||RXNORM|RXNORM||||N||");
        let edge = parse_rel(&row).unwrap();
        assert_eq!(edge.from_concept.as_str(), "315431");
        assert_eq!(edge.to_concept.as_str(), "1191");
        assert_eq!(edge.relation_type, RelationType::IngredientOf);

        let atom_level = record("||A1|SY||A2||||||||||");
        assert_eq!(parse_rel(&atom_level), Err(RrfSkip::MissingIdentifier));
    }
}
