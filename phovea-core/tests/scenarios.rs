//! End-to-end flows through the public API.

use phovea_core::{
    AppContext, AssignerKind, Config, IdAssigner, Range, Range1D, RangeElem, Selection, SliceSpec,
};

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn wire_string_selects_indices_in_order() {
    let dim = Range1D::parse("2:5,9").unwrap();
    assert_eq!(dim.to_vec(None).unwrap(), vec![2, 3, 4, 9]);

    // rebuilt from the indices it selects, the range selects the same thing
    let rebuilt = Range1D::from_list(&dim.to_vec(None).unwrap());
    assert_eq!(rebuilt.to_string(), "(2:5,9)");
    assert_eq!(rebuilt.to_vec(None).unwrap(), dim.to_vec(None).unwrap());
}

#[test]
fn multi_dimensional_address() {
    let range = Range::parse("(2:5,9),-3:").unwrap();
    assert_eq!(range.ndim(), 2);
    assert_eq!(range.to_string(), "(2:5,9),(-3:)");
    assert_eq!(Range::parse(&range.to_string()).unwrap(), range);

    assert_eq!(range.size(&[10, 6]).unwrap(), vec![4, 2]);
    assert_eq!(range.dim(1).to_vec(Some(6)).unwrap(), vec![4, 5]);
    // dimensions past the explicit ones select everything
    assert!(range.dim(2).is_all());
}

#[test]
fn request_selection_picks_rows() {
    let rows = ["r0", "r1", "r2", "r3", "r4"];

    let all = Selection::from_query(None).unwrap();
    assert_eq!(all.select(0, &rows).unwrap(), rows.to_vec());

    let explicit = Selection::from_query(Some("(4:-1,0:2)")).unwrap();
    assert_eq!(explicit.select(0, &rows).unwrap(), vec!["r4", "r0", "r1"]);
    assert_eq!(explicit.select(1, &rows).unwrap(), rows.to_vec());

    let err = Selection::from_query(Some("1:x")).unwrap_err();
    assert_eq!(err.error_type(), "range_parse_error");
}

#[test]
fn descending_element_lowers_to_slice() {
    let dim = Range1D::from(RangeElem::new(4, -1, -1).unwrap());
    assert_eq!(dim.to_vec(None).unwrap(), vec![4, 3, 2, 1, 0]);
    assert_eq!(
        dim.asslice(None).unwrap(),
        SliceSpec::Slice { start: 4, stop: None, step: -1 }
    );
    assert_eq!(
        dim.reverse().unwrap().to_vec(None).unwrap(),
        vec![0, 1, 2, 3, 4]
    );
}

#[test]
fn ids_through_context_and_ranges() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::new(tmp.path().join("ids"), AssignerKind::File);
    config.save(tmp.path()).unwrap();

    let loaded = Config::load(tmp.path().join("phovea.toml")).unwrap();
    let ctx = AppContext::from_config(loaded).unwrap();
    let uids = ctx
        .assigner()
        .assign(&names(&["TP53", "BRCA1", "BRCA2", "EGFR"]), "Gene")
        .unwrap();
    assert_eq!(uids, vec![0, 1, 2, 3]);

    // a client holding a compressed range of the uids gets the names back
    let range = Range1D::from_list(&[3, 1, 2]);
    assert_eq!(range.to_string(), "(3,1:3)");
    assert_eq!(
        ctx.assigner().unmap_range(&range, "Gene").unwrap(),
        vec![
            Some("EGFR".to_string()),
            Some("BRCA1".to_string()),
            Some("BRCA2".to_string()),
        ]
    );

    // a fresh context over the same directory sees the same assignment
    let again = AppContext::from_config(Config::load(tmp.path().join("phovea.toml")).unwrap())
        .unwrap();
    let hits = again.assigner().search("Gene", "brca", None).unwrap();
    assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2]);
}
