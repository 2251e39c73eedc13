// Summary output for a finished batch

use crate::model::BatchStats;

/// Render the end-of-batch summary, preceded by a blank line
pub fn generate_batch_report(stats: &BatchStats) -> String {
    let mut report = String::new();
    report.push('\n');
    report.push_str(&format!("Checked {} websites\n", stats.checked));
    report.push_str(&format!("Passed {} websites\n", stats.matched));
    report.push_str(&format!("Failed in {} websites\n", stats.failed));
    report.push_str(&format!("Total checked {} websites\n", stats.total()));
    report
}
