// Deterministic table column layout.
//
// Every table declares an ordered column list; each column carries a
// declared width, a readability floor (minimum width), and a shrink rank
// deciding which column gives up width first when the table must narrow.
// The fit is an explicit pure function with no hidden state.

/// Horizontal alignment of a column's cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One table column: declared geometry plus shrink priority.
///
/// `shrink_rank` orders width loss: rank 0 shrinks first (typically the
/// free-text column), higher ranks later (date/code columns last).
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub label: &'static str,
    pub width: f32,
    pub min_width: f32,
    pub shrink_rank: usize,
    pub align: Align,
}

impl ColumnSpec {
    pub fn new(
        label: &'static str,
        width: f32,
        min_width: f32,
        shrink_rank: usize,
        align: Align,
    ) -> Self {
        Self {
            label,
            width,
            min_width,
            shrink_rank,
            align,
        }
    }
}

/// Width decrement per shrink step, in millimetres
const SHRINK_STEP: f32 = 1.0;

fn total_width(columns: &[ColumnSpec]) -> f32 {
    columns.iter().map(|c| c.width).sum()
}

/// Narrow a column set to fit `target` width.
///
/// If the declared widths already fit, they are returned unchanged.
/// Otherwise columns lose width one step at a time in shrink-rank order,
/// never below their minimum. When every column sits at its minimum and
/// the sum still exceeds the target, the overflow is accepted; the
/// readability floor wins over the fit.
pub fn fit_columns(columns: &[ColumnSpec], target: f32) -> Vec<ColumnSpec> {
    let mut fitted: Vec<ColumnSpec> = columns.to_vec();

    if total_width(&fitted) <= target {
        return fitted;
    }

    // Visit order: shrink rank, ties broken by declaration order
    let mut order: Vec<usize> = (0..fitted.len()).collect();
    order.sort_by_key(|&i| fitted[i].shrink_rank);

    loop {
        if total_width(&fitted) <= target {
            break;
        }

        let shrunk = order.iter().copied().find(|&i| {
            fitted[i].width - SHRINK_STEP >= fitted[i].min_width - f32::EPSILON
        });

        match shrunk {
            Some(i) => fitted[i].width -= SHRINK_STEP,
            // All columns at their floor; accept the overflow
            None => break,
        }
    }

    fitted
}
