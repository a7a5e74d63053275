//! Output module for publishing artifacts and reporting runs
//!
//! This module handles:
//! - Publishing the seller list and image lookup into the blob store
//! - Printing crawl reports and publishing summaries

mod index;

pub use index::{publish_index, IndexSummary};

use crate::crawler::CrawlReport;

/// Prints a crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ({}) ===\n", report.crawler);

    println!("Overview:");
    println!("  Targets: {}", report.total());
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed: {}", report.failed.len());
    println!("  Elapsed: {}ms", report.elapsed_ms);
    println!();

    if !report.failed.is_empty() {
        let timeouts = report.failed.iter().filter(|f| f.timed_out).count();
        println!("Failures ({} timed out):", timeouts);
        for failure in &report.failed {
            match failure.status {
                Some(status) => println!("  - {} [HTTP {}]: {}", failure.target, status, failure.error),
                None => println!("  - {}: {}", failure.target, failure.error),
            }
        }
        println!();
    }

    let success_rate = if report.total() > 0 {
        (report.succeeded as f64 / report.total() as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} targets)",
        success_rate,
        report.succeeded,
        report.total()
    );
}

/// Prints the counts of a publishing pass
pub fn print_index_summary(summary: &IndexSummary) {
    println!("=== Index Published ===\n");
    println!("  Index entries: {}", summary.index_entries);
    println!("  Raw items: {}", summary.raw_items);
    println!(
        "  Sellers: {} ({} with review stats)",
        summary.sellers, summary.sellers_with_stats
    );
    println!(
        "  Item images: {} by ref, {} by id",
        summary.images_by_ref, summary.images_by_id
    );
}
