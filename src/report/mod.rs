//! Run summary printed after a successful extract.

use chrono::{DateTime, Local};

use crate::app::pipeline::RunOutput;

/// Plain-text table of what was written.
pub fn format_run_summary(run: &RunOutput, finished: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "ACS extract finished {}\n",
        finished.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("catalog entries: {}\n\n", run.catalog_entries));
    out.push_str(&format!(
        "{:<18} {:<8} {:>6} {:>6}  path\n",
        "topic", "group", "rows", "cols"
    ));
    for t in &run.topics {
        out.push_str(&format!(
            "{:<18} {:<8} {:>6} {:>6}  {}\n",
            t.topic,
            t.group,
            t.rows,
            t.columns,
            t.path.display()
        ));
    }

    let i = &run.indicators;
    out.push_str(&format!(
        "\nindicators: {} rows, {} columns  {}\n",
        i.rows,
        i.columns,
        i.path.display()
    ));

    let b = &run.boundary;
    out.push_str(&format!(
        "boundary: {} fetched, {} excluded, {} written, {} without polygon  {}",
        b.rows_fetched,
        b.rows_excluded,
        b.shapes.written,
        b.shapes.skipped,
        b.path.display()
    ));
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::TimeZone;

    use super::*;
    use crate::app::pipeline::{BoundaryOutput, IndicatorsOutput, TopicOutput};
    use crate::io::ShapeWriteSummary;

    #[test]
    fn lists_topics_and_boundary() {
        let run = RunOutput {
            catalog_entries: 25070,
            topics: vec![TopicOutput {
                topic: "race",
                group: "B02001",
                path: PathBuf::from("data/acs/race.csv"),
                rows: 3993,
                columns: 13,
            }],
            indicators: IndicatorsOutput {
                path: PathBuf::from("data/acs_indicators.csv"),
                rows: 3993,
                columns: 13,
            },
            boundary: BoundaryOutput {
                path: PathBuf::from("data/shp_files/block_groups.shp"),
                rows_fetched: 3993,
                rows_excluded: 10,
                shapes: ShapeWriteSummary {
                    written: 3981,
                    skipped: 2,
                },
            },
        };
        let finished = Local.with_ymd_and_hms(2020, 5, 1, 12, 0, 0).unwrap();

        let text = format_run_summary(&run, finished);
        assert!(text.contains("2020-05-01 12:00:00"));
        assert!(text.contains("race"));
        assert!(text.contains("data/acs/race.csv"));
        assert!(text.contains("indicators: 3993 rows, 13 columns  data/acs_indicators.csv"));
        assert!(text.contains("3993 fetched, 10 excluded, 3981 written, 2 without polygon"));
        assert!(!text.ends_with('\n'));
    }
}
