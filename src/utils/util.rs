use comfy_table::Cell;

use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::index::BPlusTreeIndex;
use crate::storage::page::BPlusTreePage;

const TABLE_PRESET: &str = "||--+-++|    ++++++";

/// Renders the tree level by level, one table per node.
pub fn pretty_format_index_tree(index: &BPlusTreeIndex) -> QuillIndexResult<String> {
    let mut display = String::new();

    if index.is_empty()? {
        display.push_str("Empty tree.");
        return Ok(display);
    }

    let max_keys = index.order() - 1;
    for (level_index, level) in index.levels()?.into_iter().enumerate() {
        display.push_str(&format!("B+ Tree Level No.{}:\n", level_index + 1));

        let mut level_table = comfy_table::Table::new();
        level_table.load_preset(TABLE_PRESET);
        let mut level_header = vec![];
        let mut level_row = vec![];

        for block_id in level {
            let mut page_table = comfy_table::Table::new();
            page_table.load_preset(TABLE_PRESET);
            let mut page_header = Vec::new();
            let mut page_row = Vec::new();

            match index.page(block_id) {
                Some(BPlusTreePage::Internal(internal_page)) => {
                    let keys = internal_page.keys()?;
                    let children = internal_page.children()?;
                    // child 0 sits under an empty header cell
                    page_header.push(Cell::new(""));
                    page_header.extend(keys.iter().map(Cell::new));
                    page_row.extend(children.iter().map(Cell::new));

                    level_header.push(Cell::new(format!(
                        "block_id={}, size: {}/{}",
                        block_id,
                        keys.len(),
                        max_keys
                    )));
                }
                Some(BPlusTreePage::Leaf(leaf_page)) => {
                    let header = leaf_page.header()?;
                    for entry in leaf_page.entries()? {
                        page_header.push(Cell::new(&entry.key));
                        page_row.push(Cell::new(entry.record_pointer));
                    }

                    level_header.push(Cell::new(format!(
                        "block_id={}, size: {}/{}, prev={}, next={}",
                        block_id,
                        header.num_entries,
                        max_keys,
                        header.prev_leaf_id,
                        header.next_leaf_id
                    )));
                }
                _ => {
                    return Err(QuillIndexError::Internal(format!(
                        "block {} is not a tree node",
                        block_id
                    )))
                }
            }

            page_table.set_header(page_header);
            page_table.add_row(page_row);
            level_row.push(Cell::new(page_table));
        }

        level_table.set_header(level_header);
        level_table.add_row(level_row);
        display.push_str(&format!("{level_table}\n"));
    }
    Ok(display)
}
