use cobolt_testsuite::{layout, CUSTOMER_COPYBOOK};

#[test]
fn customer_layout_resolves() {
    let layout = layout(CUSTOMER_COPYBOOK);
    // 6 + 10 + 4 (packed S9(5)V99) + 2 + 3*2 + 4 (binary S9(9))
    assert_eq!(layout.record_len(), 32);

    let balance = layout.field(layout.find("CUST-BALANCE").unwrap());
    assert_eq!(balance.offset, 16);
    assert_eq!(balance.size, 4);

    let count = layout.field(layout.find("CUST-COUNT").unwrap());
    assert_eq!(count.offset, 28);
}

#[test]
fn conditions_are_recorded_but_occupy_no_storage() {
    let layout = layout(CUSTOMER_COPYBOOK);
    let status = layout.field(layout.find("CUST-STATUS").unwrap());

    assert_eq!(status.size, 1);
    assert_eq!(status.conditions.len(), 2);
    assert_eq!(status.conditions[1].name, "CLOSED");
    assert_eq!(status.conditions[1].literal, "C");
}

#[test]
fn group_sizes_sum_their_children() {
    let layout = layout(CUSTOMER_COPYBOOK);
    let root = layout.field(layout.root());
    let record = layout.field(root.children[0]);

    let sum: usize = record
        .children
        .iter()
        .map(|&c| layout.field(c))
        .filter(|f| f.redefines.is_none())
        .map(|f| f.size)
        .sum();

    assert_eq!(sum, record.size);
}

#[test]
fn redefines_offsets_match_their_target() {
    let layout = layout(
        "01 REC.
           05 RAW PIC X(8).
           05 VIEW REDEFINES RAW.
              10 LEFT-HALF PIC X(4).
              10 RIGHT-HALF PIC 9(4).",
    );

    let raw = layout.field(layout.find("RAW").unwrap());
    let view = layout.field(layout.find("VIEW").unwrap());
    assert_eq!(view.offset, raw.offset);
    assert_eq!(layout.field(layout.find("RIGHT-HALF").unwrap()).offset, 4);
    assert_eq!(layout.record_len(), 8);
}
