//! Warehouse by size stock matrix per style, for a quick console overview

use crate::models::InventoryRow;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Distributor's own warehouse ordering; unknown warehouses follow alphabetically
pub const KNOWN_WAREHOUSES: [&str; 9] = [
    "Dallas, TX",
    "Cincinnati, OH",
    "Richmond, VA",
    "Jacksonville, FL",
    "Phoenix, AZ",
    "Reno, NV",
    "Minneapolis, MN",
    "Robbinsville, NJ",
    "Seattle, WA",
];

pub const TOTAL_LABEL: &str = "Total Inventory";
/// Column used for rows that carry no size
pub const NO_SIZE_LABEL: &str = "OSFA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleMatrix {
    pub style: String,
    pub sizes: Vec<String>,
    /// (warehouse label, quantity per size)
    pub warehouses: Vec<(String, Vec<u64>)>,
    pub totals: Vec<u64>,
}

impl StyleMatrix {
    /// Quantity for a warehouse label and size, 0 when either is unknown
    pub fn quantity(&self, warehouse: &str, size: &str) -> u64 {
        let Some(col) = self.sizes.iter().position(|s| s == size) else {
            return 0;
        };
        self.warehouses
            .iter()
            .find(|(label, _)| label == warehouse)
            .map(|(_, quantities)| quantities[col])
            .unwrap_or(0)
    }

    /// Fixed-width text table, one line per warehouse plus a total line
    pub fn render(&self) -> String {
        let label_width = self
            .warehouses
            .iter()
            .map(|(label, _)| label.chars().count())
            .chain([TOTAL_LABEL.len(), self.style.len()])
            .max()
            .unwrap_or(0);

        let widths: Vec<usize> = self
            .sizes
            .iter()
            .enumerate()
            .map(|(col, size)| {
                let widest = self.totals[col].to_string().len();
                size.chars().count().max(widest).max(3)
            })
            .collect();

        let mut output = String::new();

        output.push_str(&format!("{:<label_width$}", self.style));
        for (size, width) in self.sizes.iter().zip(&widths) {
            output.push_str(&format!(" | {size:>width$}"));
        }
        output.push('\n');

        output.push_str(&"-".repeat(label_width));
        for width in &widths {
            output.push_str(&format!("-+-{:-<width$}", ""));
        }
        output.push('\n');

        for (label, quantities) in &self.warehouses {
            output.push_str(&format_line(label, quantities, label_width, &widths));
        }
        output.push_str(&format_line(TOTAL_LABEL, &self.totals, label_width, &widths));
        output
    }
}

fn format_line(label: &str, quantities: &[u64], label_width: usize, widths: &[usize]) -> String {
    let mut line = format!("{label:<label_width$}");
    for (qty, width) in quantities.iter().zip(widths) {
        line.push_str(&format!(" | {qty:>width$}"));
    }
    line.push('\n');
    line
}

/// One matrix per style, in order of first appearance
pub fn build_matrices(rows: &[InventoryRow]) -> Vec<StyleMatrix> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_style: HashMap<&str, Vec<&InventoryRow>> = HashMap::new();
    for row in rows {
        by_style
            .entry(row.style.as_str())
            .or_insert_with(|| {
                order.push(row.style.as_str());
                Vec::new()
            })
            .push(row);
    }

    order
        .into_iter()
        .map(|style| build_matrix(style, &by_style[style]))
        .collect()
}

fn build_matrix(style: &str, rows: &[&InventoryRow]) -> StyleMatrix {
    let mut cells: HashMap<(String, String), u64> = HashMap::new();
    let mut sizes: Vec<String> = Vec::new();
    let mut warehouses: Vec<String> = Vec::new();

    for row in rows {
        let size = size_label(&row.size);
        let warehouse = warehouse_label(row);
        if !sizes.contains(&size) {
            sizes.push(size.clone());
        }
        if !warehouses.contains(&warehouse) {
            warehouses.push(warehouse.clone());
        }
        *cells.entry((warehouse, size)).or_insert(0) += row.quantity;
    }

    sizes.sort_by(|a, b| compare_sizes(a, b));
    warehouses.sort_by(|a, b| compare_warehouses(a, b));

    let mut totals = vec![0; sizes.len()];
    let warehouses = warehouses
        .into_iter()
        .map(|warehouse| {
            let quantities: Vec<u64> = sizes
                .iter()
                .map(|size| {
                    cells
                        .get(&(warehouse.clone(), size.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect();
            for (total, qty) in totals.iter_mut().zip(&quantities) {
                *total += qty;
            }
            (warehouse, quantities)
        })
        .collect();

    StyleMatrix {
        style: style.to_string(),
        sizes,
        warehouses,
        totals,
    }
}

fn size_label(size: &str) -> String {
    let size = size.trim().to_uppercase();
    if size.is_empty() {
        NO_SIZE_LABEL.to_string()
    } else {
        size
    }
}

fn warehouse_label(row: &InventoryRow) -> String {
    let name = row.warehouse_name.trim();
    let id = row.warehouse_id.trim();
    match (name.is_empty(), id.is_empty()) {
        (false, _) => name.to_string(),
        (true, false) => format!("Warehouse {id}"),
        (true, true) => "Unassigned".to_string(),
    }
}

fn compare_warehouses(a: &str, b: &str) -> Ordering {
    let rank = |name: &str| KNOWN_WAREHOUSES.iter().position(|w| *w == name);
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Garment order: XS..XL, tall sizes, 2XL and up, numeric sizes, the rest
pub fn compare_sizes(a: &str, b: &str) -> Ordering {
    size_key(a).cmp(&size_key(b))
}

fn size_key(size: &str) -> (u8, u32, String) {
    let size = size.trim().to_uppercase();

    let base = match size.as_str() {
        "XS" => Some(1),
        "S" => Some(2),
        "M" => Some(3),
        "L" => Some(4),
        "XL" => Some(5),
        "XXL" => Some(6),
        "XXXL" => Some(7),
        _ => None,
    };
    if let Some(rank) = base {
        // XXL and XXXL sort with their numbered spellings
        return match rank {
            6 => (2, 2, size),
            7 => (2, 3, size),
            _ => (0, rank, size),
        };
    }

    if let Some(prefix) = size.strip_suffix('T') {
        let tall = match prefix {
            "L" => Some(1),
            "XL" => Some(2),
            _ => prefix
                .strip_suffix("XL")
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| n + 1),
        };
        if let Some(rank) = tall {
            return (1, rank, size);
        }
    }

    if let Some(n) = size.strip_suffix("XL").and_then(|n| n.parse::<u32>().ok()) {
        return (2, n, size);
    }

    if let Ok(n) = size.parse::<u32>() {
        return (3, n, size);
    }

    (4, 0, size)
}
