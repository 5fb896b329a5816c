use std::fmt;

use crate::counts::{CategoryKey, ErrorBreakdown, SuccessCount};
use crate::snapshot::Snapshot;

// Percentages of a zero total come out as NaN.
fn percent(count: u64, total: u64) -> f64 {
    count as f64 / total as f64 * 100.0
}

impl fmt::Display for SuccessCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} successes", self.count())
    }
}

impl<K: CategoryKey> fmt::Display for ErrorBreakdown<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_count();
        for (category, count) in self.by_category() {
            writeln!(
                f,
                "  {:<30} {:>10} ({:>6.2}%)",
                format!("{:?}", category),
                count,
                percent(*count, total)
            )?;
        }
        writeln!(
            f,
            "  {:<30} {:>10} ({:>6.2}%)",
            "uncategorized",
            self.uncategorized_count(),
            percent(self.uncategorized_count(), total)
        )?;
        write!(f, "  {:<30} {:>10}", "total", total)
    }
}

impl<K: CategoryKey> fmt::Display for Snapshot<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Events: {}", self.event_count())?;
        writeln!(
            f,
            "Successes: {} ({:.2}%)",
            self.success_count(),
            percent(self.success_count(), self.event_count())
        )?;
        writeln!(f, "Errors:")?;
        write!(f, "{}", self.errors())
    }
}

pub fn print_snapshot_report<K: CategoryKey>(snapshot: &Snapshot<K>) {
    println!("\n{}", "=".repeat(60));
    println!("TASK OUTCOME REPORT");
    println!("{}", "=".repeat(60));

    println!("\nSummary:");
    println!("  Total Events:        {:>10}", snapshot.event_count());
    println!("  Successful:          {:>10}", snapshot.success_count());
    println!("  Failed:              {:>10}", snapshot.total_error_count());
    println!(
        "  Success Rate:        {:>9.2}%",
        percent(snapshot.success_count(), snapshot.event_count())
    );

    println!("\nErrors by category:");
    println!("{}", snapshot.errors());

    println!("\n{}", "=".repeat(60));
}
