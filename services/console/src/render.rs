use price_wizard::wizard::{
    format_rupiah, format_usd, ComparableListing, EnrichmentOutcome, FieldRegistry,
    PredictionResponse, PriceEstimate, SessionView, Toast, ToastLevel,
};

pub(crate) fn render_step(view: &SessionView, registry: &FieldRegistry) {
    println!(
        "\nStep {}/{}: {}",
        view.step + 1,
        view.step_count,
        view.title
    );
    if !view.description.is_empty() {
        println!("{}", view.description);
    }

    for name in registry.fields_of(view.step) {
        let Some(spec) = registry.spec_of(name) else {
            continue;
        };
        let marker = if view.form.filled.is_filled(name) {
            "x"
        } else {
            " "
        };
        let value = view.form.display_value(name);
        let mut line = format!("  [{marker}] {} ({name}) = {value}", spec.label);
        if spec.read_only {
            line.push_str("  (auto)");
        }
        if let Some(hint) = spec.range_hint() {
            line.push_str(&format!("  [{hint}]"));
        }
        println!("{line}");
        if !spec.helper_text.is_empty() {
            println!("        {}", spec.helper_text);
        }
    }

    if let Some(status) = view.location_status {
        println!("  {status}");
    }
    if let Some(toast) = &view.toast {
        render_toast(toast);
    }
}

pub(crate) fn render_toast(toast: &Toast) {
    let level = match toast.level {
        ToastLevel::Warning => "warning",
        ToastLevel::Error => "error",
    };
    println!("! [{level}] {}", toast.message);
}

pub(crate) fn render_enrichment(outcome: &EnrichmentOutcome) {
    match outcome {
        EnrichmentOutcome::Applied { city, district } => {
            println!(
                "Location resolved: city {} | district {}",
                city.as_deref().unwrap_or("(unchanged)"),
                district.as_deref().unwrap_or("(unchanged)")
            );
        }
        EnrichmentOutcome::Failed { reason } => {
            println!("Location lookup failed: {reason}");
        }
        EnrichmentOutcome::Superseded => {}
    }
}

pub(crate) fn render_result(response: &PredictionResponse, registry: &FieldRegistry) {
    println!("\nEstimated price");
    match response.estimate() {
        Some(PriceEstimate::Local { formatted, .. }) => println!("  {formatted}"),
        Some(PriceEstimate::Converted {
            usd,
            idr,
            exchange_rate,
        }) => {
            println!("  {}", format_usd(usd));
            println!("  {}", format_rupiah(idr));
            println!("  rate: 1 USD = {}", format_rupiah(exchange_rate));
        }
        None => println!("  (no price returned)"),
    }

    let listings = response.similar_listings();
    if listings.is_empty() {
        return;
    }
    println!("\nSimilar properties");
    render_listing_table(listings, &listing_columns(listings, registry));
}

/// Registry fields present in the listings, in registry order, followed by
/// every other key the listings carry in first-seen order.
fn listing_columns(listings: &[ComparableListing], registry: &FieldRegistry) -> Vec<String> {
    let mut columns: Vec<String> = registry
        .fields()
        .iter()
        .map(|spec| spec.name)
        .filter(|name| listings.iter().any(|listing| listing.attribute(name).is_some()))
        .map(str::to_string)
        .collect();
    for listing in listings {
        for key in listing.attributes.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn render_listing_table(listings: &[ComparableListing], columns: &[String]) {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(listings.len() + 1);
    let mut header = vec!["Price".to_string()];
    header.extend(columns.iter().cloned());
    rows.push(header);
    for listing in listings {
        let mut row = vec![format_rupiah(listing.price)];
        row.extend(columns.iter().map(|column| listing.attribute_text(column)));
        rows.push(row);
    }

    let widths: Vec<usize> = (0..=columns.len())
        .map(|index| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        println!("  {}", cells.join(" | ").trim_end());
    }
}

pub(crate) fn render_schema(registry: &FieldRegistry) {
    for (index, step) in registry.steps().iter().enumerate() {
        println!("{}. {} ({})", index + 1, step.title, step.key);
        for name in &step.fields {
            let Some(spec) = registry.spec_of(name) else {
                continue;
            };
            let hint = spec
                .range_hint()
                .map(|hint| format!(" [{hint}]"))
                .unwrap_or_default();
            let auto = if spec.read_only { " (auto)" } else { "" };
            println!(
                "   - {name}: {} <{}>{hint}{auto}",
                spec.label,
                spec.kind.label()
            );
        }
    }
    if let Some(binding) = registry.location() {
        println!(
            "Map picks fill {}/{} and resolve {}/{}",
            binding.latitude, binding.longitude, binding.city, binding.district
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use price_wizard::wizard::SchemaVariant;
    use serde_json::json;

    fn listing(value: serde_json::Value) -> ComparableListing {
        serde_json::from_value(value).expect("listing decodes")
    }

    #[test]
    fn listing_columns_keep_keys_outside_the_schema() {
        let registry = SchemaVariant::Bandung.registry().expect("schema valid");
        let listings = vec![
            listing(json!({ "Price": 1.1e9, "City/Regency": "Bandung", "Land": 110 })),
            listing(json!({ "Price": 9.0e8, "Bedroom": 2, "Kecamatan": "Coblong" })),
        ];

        let columns = listing_columns(&listings, &registry);
        assert_eq!(columns[..2], ["Land".to_string(), "Bedroom".to_string()]);
        assert!(columns.contains(&"City/Regency".to_string()));
        assert!(columns.contains(&"Kecamatan".to_string()));
        assert_eq!(columns.len(), 4);
    }

    #[test]
    fn listing_columns_fall_back_to_listing_keys() {
        let registry = SchemaVariant::KingCounty.registry().expect("schema valid");
        let listings = vec![listing(json!({ "Price": 1.0, "Luas": 90 }))];
        assert_eq!(listing_columns(&listings, &registry), vec!["Luas".to_string()]);
    }
}
