//! Table disambiguation and table structure repair

use tracing::debug;

use super::wrapping::{complex_wrap, missing_root_replacement};
use crate::tree::kind::{KindSet, TABLE_CELLS, TABLE_MEMBERS};
use crate::tree::{DocTree, Element, Kind};

/// Scaffolding flattened with a layout table that sits inside a box.
const LAYOUT_MEMBERS: KindSet = TABLE_CELLS.union(KindSet::of(&[Kind::Row]));

/// Reclassify tables that are used for layout.
///
/// Cells and rows are counted in document order, stopping at a nested table.
/// A table with as many cells as rows, or with fewer than two cells, is a
/// box. When that box would sit inside another box, the table is flattened
/// into its parent box instead.
pub fn disambiguate_table_or_frame(doc: &mut DocTree, url: &str) {
    debug!(url, "disambiguating tables and frames");
    for table in doc.find_kind(doc.root(), Kind::Table) {
        let mut cells = 0usize;
        let mut rows = 0usize;
        let mut members = Vec::new();
        for desc in doc.descendant_elements(table) {
            match doc.kind(desc) {
                Some(kind) if TABLE_CELLS.contains(kind) => cells += 1,
                Some(Kind::Row) => rows += 1,
                Some(Kind::Table) => break,
                _ => {}
            }
            if doc.is_any(desc, LAYOUT_MEMBERS) {
                members.push(desc);
            }
        }
        if !(cells == rows || cells < 2) {
            continue;
        }

        let inside_box = doc
            .node(table)
            .is_some_and(|n| n.ancestors().any(|a| doc.is_kind(a.id(), Kind::Box)));
        if inside_box {
            debug!(url, cells, rows, "layout table inside a box is flattened");
            doc.set_label(table, Kind::ToUnwrap);
            for member in members {
                doc.set_label(member, Kind::ToUnwrap);
            }
        } else {
            doc.set_label(table, Kind::Box);
        }
    }
}

/// Give every table a row/cell skeleton the output grammar accepts.
pub fn correct_table_structure(doc: &mut DocTree, url: &str) {
    debug!(url, "correcting table structure");
    let root = doc.root();

    for table in doc.find_kind(root, Kind::Table) {
        for child in doc.element_children(table) {
            if !doc.is_any(child, TABLE_MEMBERS) && !doc.is_kind(child, Kind::TableHeading) {
                doc.unwrap(child);
            }
        }
        for child in doc.children_of_kind(table, Kind::RowValid) {
            if doc.children_of_kind(child, Kind::ColumnValid).is_empty() {
                doc.set_label(child, Kind::ColumnRow);
            }
        }
    }

    for table in doc.find_kind(root, Kind::Table) {
        if !doc.children_of_kind(table, Kind::ColumnValid).is_empty() {
            missing_root_replacement(doc, table, Kind::ColumnValid, Kind::RowValid, false);
        }
        doc.unwrap_all(table, KindSet::of(&[Kind::Paragraph]));
        for row in doc.find_kind(table, Kind::RowValid) {
            if doc.immediate_words(row) > 0 {
                complex_wrap(doc, row, Kind::ColumnValid);
            }
        }
    }

    // A table heading is a caption directly under a table and a header
    // cell directly under a row; anywhere else it is an ordinary heading.
    for heading in doc.find_kind(root, Kind::TableHeading) {
        match doc.parent(heading).and_then(|parent| doc.kind(parent)) {
            Some(Kind::Table) => {}
            Some(Kind::RowValid) => doc.set_label(heading, Kind::ColumnValid),
            _ => doc.set_label(heading, Kind::Heading),
        }
    }

    for row in doc.find_kind(root, Kind::RowValid) {
        for child in doc.element_children(row) {
            if !doc.is_kind(child, Kind::ColumnValid) {
                doc.wrap(child, Element::new(Kind::ColumnValid));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ego_tree::NodeId;

    fn el(doc: &mut DocTree, parent: NodeId, kind: Kind, text: Option<&str>) -> NodeId {
        let id = doc.append_element(parent, Element::new(kind));
        if let Some(text) = text {
            doc.append_text(id, text);
        }
        id
    }

    fn table(doc: &mut DocTree, parent: NodeId, rows: usize, cols: usize) -> NodeId {
        let t = el(doc, parent, Kind::Table, None);
        for r in 0..rows {
            let row = el(doc, t, Kind::Row, None);
            for c in 0..cols {
                el(doc, row, Kind::Column, Some(&format!("{r}{c}")));
            }
        }
        t
    }

    #[test]
    fn test_cell_row_balance_decides() {
        let mut doc = DocTree::new();
        let root = doc.root();
        let single_column = table(&mut doc, root, 3, 1);
        let real = table(&mut doc, root, 2, 2);
        let lonely = table(&mut doc, root, 1, 1);

        disambiguate_table_or_frame(&mut doc, "u");
        assert!(doc.is_kind(single_column, Kind::Box));
        assert!(doc.is_kind(real, Kind::Table));
        assert!(doc.is_kind(lonely, Kind::Box));
    }

    #[test]
    fn test_layout_table_in_box_is_flattened() {
        let mut doc = DocTree::new();
        let root = doc.root();
        let frame = el(&mut doc, root, Kind::Box, Some("szöveg "));
        let t = table(&mut doc, frame, 1, 1);
        disambiguate_table_or_frame(&mut doc, "u");
        assert!(doc.is_kind(t, Kind::ToUnwrap));
        doc.unwrap_all(root, KindSet::of(&[Kind::ToUnwrap]));
        assert_eq!(doc.render(root), r#"(root (box "szöveg " "00"))"#);
    }

    #[test]
    fn test_structure_repair() {
        let mut doc = DocTree::new();
        let root = doc.root();
        let t = el(&mut doc, root, Kind::Table, None);
        let tbody = el(&mut doc, t, Kind::Paragraph, None);
        let empty_row = el(&mut doc, tbody, Kind::RowValid, None);
        el(&mut doc, empty_row, Kind::Bold, Some("fejléc"));
        el(&mut doc, tbody, Kind::ColumnValid, Some("a"));
        el(&mut doc, tbody, Kind::ColumnValid, Some("b"));
        let row = el(&mut doc, tbody, Kind::RowValid, None);
        el(&mut doc, row, Kind::ColumnValid, Some("c"));
        el(&mut doc, row, Kind::Italic, Some("d"));

        correct_table_structure(&mut doc, "u");
        assert_eq!(
            doc.render(root),
            concat!(
                r#"(root (table (column_row (bold "fejléc"))"#,
                r#" (row_valid (column_valid "a") (column_valid "b"))"#,
                r#" (row_valid (column_valid "c") (column_valid (italic "d")))))"#
            )
        );
    }

    #[test]
    fn test_table_headings_fit_their_place() {
        let mut doc = DocTree::new();
        let root = doc.root();
        let t = el(&mut doc, root, Kind::Table, None);
        el(&mut doc, t, Kind::TableHeading, Some("Eredmények"));
        let row = el(&mut doc, t, Kind::RowValid, None);
        el(&mut doc, row, Kind::TableHeading, Some("Csapat"));
        let cell = el(&mut doc, row, Kind::ColumnValid, None);
        el(&mut doc, cell, Kind::TableHeading, Some("Pont"));
        let list = el(&mut doc, root, Kind::List, None);
        let item = el(&mut doc, list, Kind::ListItem, None);
        el(&mut doc, item, Kind::TableHeading, Some("Tétel"));

        correct_table_structure(&mut doc, "u");
        assert_eq!(
            doc.render(root),
            concat!(
                r#"(root (table (table_heading "Eredmények")"#,
                r#" (row_valid (column_valid "Csapat") (column_valid (heading "Pont"))))"#,
                r#" (list (list_item (heading "Tétel"))))"#
            )
        );
    }
}
