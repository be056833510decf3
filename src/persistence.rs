//! Writing solution listings to disk.
//!
//! The listing is plain text: a header with the solution count followed by
//! each solution rendered with [`format_solution`], separated by blank lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::grid::{format_solution, QuiltBoard};
use crate::solver::Solution;

/// Renders a listing of solutions for `board`.
pub fn format_listing(board: &QuiltBoard, solutions: &[Solution]) -> String {
    let mut output = format!("Found {} solutions:\n\n", solutions.len());
    for (i, solution) in solutions.iter().enumerate() {
        output.push_str(&format!("Solution {}:\n", i + 1));
        output.push_str(&format_solution(board, solution));
        output.push('\n');
    }
    output
}

/// Saves solutions in human-readable text format.
pub fn save_text(path: impl AsRef<Path>, board: &QuiltBoard, solutions: &[Solution]) -> std::io::Result<()> {
    let path = path.as_ref();
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(format_listing(board, solutions).as_bytes())?;
    file.flush()?;
    info!("wrote {} solutions to {}", solutions.len(), path.display());
    Ok(())
}
