// ── Metadata Inspection ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MetadataReport {
    rows: Vec<MetadataRow>,
    tag_frequency: Vec<TagFrequencyGroup>,
    top_tags: Vec<metadata::TagFrequency>,
    searchable_strings: Vec<String>,
}

fn build_metadata_report(
    blob: &serde_json::Value,
    include_tag_frequency: bool,
    top: usize,
) -> MetadataReport {
    let rows = if include_tag_frequency {
        metadata::flatten_metadata(blob, |_| false)
    } else {
        metadata::flatten_metadata(blob, metadata::is_tag_frequency_key)
    };
    let tag_frequency = metadata::extract_tag_frequency(blob);
    let top_tags = metadata::top_tags(&tag_frequency, top);
    let searchable_strings = metadata::collect_strings(blob).into_iter().collect();

    MetadataReport {
        rows,
        tag_frequency,
        top_tags,
        searchable_strings,
    }
}

fn inspect_metadata_file(
    path: &Path,
    format: OutputFormat,
    include_tag_frequency: bool,
    top: usize,
) -> Result<(), String> {
    let blob = read_json_file(path)?;
    let report = build_metadata_report(&blob, include_tag_frequency, top);
    log::info!(
        "Inspected {}: {} rows, {} tag groups",
        path.display(),
        report.rows.len(),
        report.tag_frequency.len()
    );

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            let csv = build_rows_csv(&report.rows).map_err(|e| e.to_string())?;
            print!("{}", csv);
        }
        OutputFormat::Table => print_metadata_table(&report),
    }
    Ok(())
}

fn build_rows_csv(rows: &[MetadataRow]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["path", "value"])?;
    for row in rows {
        wtr.write_record([row.path.as_str(), row.value.as_str()])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn print_metadata_table(report: &MetadataReport) {
    if report.rows.is_empty() {
        println!("(no metadata)");
    }
    let width = report
        .rows
        .iter()
        .map(|row| row.path.chars().count())
        .max()
        .unwrap_or(0);
    for row in &report.rows {
        println!("{:<width$}  {}", row.path, row.value, width = width);
    }

    for group in &report.tag_frequency {
        println!();
        println!("[{}] {} tags", group.scope, group.tags.len());
        for tag in &group.tags {
            println!("  {:>6}  {}", tag.count, tag.label);
        }
    }

    if !report.top_tags.is_empty() {
        println!();
        println!("Top tags:");
        for tag in &report.top_tags {
            println!("  {:>6}  {}", tag.count, tag.label);
        }
    }
}
