use super::types::{Display, MonitorSelection};

/// Resolve a monitor selection against a display snapshot.
///
/// * `Primary` – the display flagged primary, or the first one if none is.
/// * `All` – every display, enumeration order preserved.
/// * `Specific(i)` – `displays[i]`; out-of-range indices behave like `Primary`.
///
/// An empty snapshot resolves to an empty list.
pub fn resolve(selection: MonitorSelection, displays: &[Display]) -> Vec<Display> {
    match selection {
        MonitorSelection::All => displays.to_vec(),
        MonitorSelection::Specific(index) => match displays.get(index) {
            Some(display) => vec![display.clone()],
            None => {
                tracing::debug!(
                    "Display index {} out of range ({} available), using primary",
                    index,
                    displays.len()
                );
                primary(displays)
            }
        },
        MonitorSelection::Primary => primary(displays),
    }
}

fn primary(displays: &[Display]) -> Vec<Display> {
    displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
        .cloned()
        .into_iter()
        .collect()
}
